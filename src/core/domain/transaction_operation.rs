use async_trait::async_trait;
use thiserror::Error;

use crate::core::domain::command::CommandError;
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::transaction::TransactionError;

#[derive(Debug, Error)]
pub enum TransactionOperationError {
    #[error(transparent)]
    TransactionError(#[from] TransactionError),

    #[error(transparent)]
    CommandError(#[from] CommandError),
}

/// A unit of business work run inside a transaction boundary.
///
/// The operation receives only the execution context; repositories it calls
/// find the active transaction through it.
#[async_trait]
pub trait BoxedTransactionOperation: Send + Sync {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<(), TransactionOperationError>;
}
