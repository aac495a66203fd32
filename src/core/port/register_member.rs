use async_trait::async_trait;
use thiserror::Error;

use crate::core::domain::entity::member::member::{MemberValidationError, UnvalidatedMember};
use crate::core::domain::entity::member::Member;
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::transaction_manager::TransactionManagerError;

#[async_trait]
pub trait RegisterMemberInputBoundary: Send + Sync {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        input: UnvalidatedMember,
        output_boundary: &mut dyn RegisterMemberOutputBoundary,
    ) -> Result<(), RegisterMemberError>;
}

#[derive(Debug, Error)]
pub enum RegisterMemberError {
    #[error(transparent)]
    ValidationError(#[from] MemberValidationError),

    #[error(transparent)]
    TransactionError(#[from] TransactionManagerError),

    #[error("Failed to process output: {0}")]
    OutputError(#[from] RegisterMemberOutputError),
}

pub trait RegisterMemberOutputBoundary: Send + Sync {
    fn execute(&mut self, output: Member) -> Result<(), RegisterMemberOutputError>;
}

#[derive(Debug, Error)]
pub enum RegisterMemberOutputError {
    #[error("Failed to format response: {0}")]
    FormatError(String),

    #[error("Invalid output state: {0}")]
    InvalidStateError(String),
}
