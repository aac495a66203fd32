pub mod member;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::domain::command::CommandError;
use crate::core::domain::entity::member::member::validate_money;
use crate::core::domain::execution::ExecutionContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,
    pub money: i64,
}

impl Member {
    pub fn new(member_id: impl Into<String>, money: i64) -> Self {
        Self {
            member_id: member_id.into(),
            money,
        }
    }
}

/// Member persistence. Every call runs on the transaction active for `ctx`
/// when there is one.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn save(&self, ctx: &ExecutionContext, member: Member) -> Result<Member, CommandError>;

    async fn find_by_id(
        &self,
        ctx: &ExecutionContext,
        member_id: &str,
    ) -> Result<Member, CommandError>;

    /// Set the balance of `member_id` to `money`.
    async fn update(
        &self,
        ctx: &ExecutionContext,
        member_id: &str,
        money: i64,
    ) -> Result<(), CommandError>;

    async fn delete(&self, ctx: &ExecutionContext, member_id: &str) -> Result<(), CommandError>;

    /// Change the balance of `member_id` by `delta`.
    ///
    /// Read and write are two statements; run this inside a transaction when
    /// it has to be atomic.
    async fn update_by(
        &self,
        ctx: &ExecutionContext,
        member_id: &str,
        delta: i64,
    ) -> Result<Member, CommandError> {
        let current = self.find_by_id(ctx, member_id).await?;
        let money = current
            .money
            .checked_add(delta)
            .ok_or_else(|| CommandError::ValidationError {
                details: format!("balance overflow for member {}", member_id),
            })?;
        validate_money(money)?;
        self.update(ctx, member_id, money).await?;
        Ok(Member { money, ..current })
    }
}
