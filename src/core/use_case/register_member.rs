use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::core::domain::entity::member::member::UnvalidatedMember;
use crate::core::domain::entity::member::{Member, MemberRepository};
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::transaction_manager::TransactionManager;
use crate::core::domain::transaction_operation::{
    BoxedTransactionOperation, TransactionOperationError,
};

use crate::core::port::register_member::{
    RegisterMemberError, RegisterMemberInputBoundary, RegisterMemberOutputBoundary,
};

pub struct InsertMemberOperation {
    member: Member,
    member_repository: Arc<dyn MemberRepository>,
}

impl InsertMemberOperation {
    pub fn new(member: Member, member_repository: Arc<dyn MemberRepository>) -> Self {
        Self {
            member,
            member_repository,
        }
    }
}

#[async_trait]
impl BoxedTransactionOperation for InsertMemberOperation {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<(), TransactionOperationError> {
        self.member_repository
            .save(ctx, self.member.clone())
            .await
            .map_err(TransactionOperationError::CommandError)?;
        Ok(())
    }
}

pub struct RegisterMemberUseCase {
    repository: Arc<dyn MemberRepository>,
    transaction_manager: Arc<dyn TransactionManager>,
}

impl RegisterMemberUseCase {
    pub fn new(
        repository: Arc<dyn MemberRepository>,
        transaction_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            repository,
            transaction_manager,
        }
    }
}

#[async_trait]
impl RegisterMemberInputBoundary for RegisterMemberUseCase {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        input: UnvalidatedMember,
        output_boundary: &mut dyn RegisterMemberOutputBoundary,
    ) -> Result<(), RegisterMemberError> {
        let member = Member::try_from(input)?;
        let operation = Box::new(InsertMemberOperation::new(
            member.clone(),
            self.repository.clone(),
        ));
        self.transaction_manager.execute(ctx, operation).await?;
        info!(%ctx, member_id = %member.member_id, "member registered");

        output_boundary.execute(member)?;

        Ok(())
    }
}
