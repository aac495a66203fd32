use async_trait::async_trait;
use thiserror::Error;

use crate::core::domain::command::CommandError;
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::transaction::TransactionError;
use crate::core::domain::transaction_operation::{
    BoxedTransactionOperation, TransactionOperationError,
};

#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Run `operation` inside a transaction for `ctx`, joining the one already
    /// active for `ctx` if there is one.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        operation: Box<dyn BoxedTransactionOperation>,
    ) -> Result<(), TransactionManagerError>;
}

/// Outcome of a failed transactional call.
///
/// `E` is the business error type of the body.
#[derive(Debug, Error)]
pub enum TransactionManagerError<E = TransactionOperationError> {
    /// Acquire, begin, commit or registration failed.
    #[error(transparent)]
    TransactionError(#[from] TransactionError),

    /// The body failed; the transaction was rolled back.
    #[error("Operation failed: {0}")]
    OperationError(#[source] E),

    /// The body failed and so did the rollback. The store may be inconsistent.
    #[error("Rollback failed ({rollback}) after operation error: {original}")]
    RollbackFailed {
        #[source]
        rollback: TransactionError,
        original: E,
    },
}

impl<E> TransactionManagerError<E> {
    /// The business error, when the body is what failed.
    pub fn operation(&self) -> Option<&E> {
        match self {
            TransactionManagerError::OperationError(e) => Some(e),
            TransactionManagerError::RollbackFailed { original, .. } => Some(original),
            TransactionManagerError::TransactionError(_) => None,
        }
    }

    pub fn into_operation(self) -> Option<E> {
        match self {
            TransactionManagerError::OperationError(e) => Some(e),
            TransactionManagerError::RollbackFailed { original, .. } => Some(original),
            TransactionManagerError::TransactionError(_) => None,
        }
    }

    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, TransactionManagerError::RollbackFailed { .. })
    }
}

/// Lets a nested transactional call surface through `?` in an outer body.
/// A rollback failure keeps the rollback error, the more serious of the two.
impl From<TransactionManagerError<CommandError>> for CommandError {
    fn from(value: TransactionManagerError<CommandError>) -> Self {
        match value {
            TransactionManagerError::TransactionError(e) => CommandError::Transaction(e),
            TransactionManagerError::OperationError(e) => e,
            TransactionManagerError::RollbackFailed { rollback, .. } => {
                CommandError::Transaction(rollback)
            }
        }
    }
}
