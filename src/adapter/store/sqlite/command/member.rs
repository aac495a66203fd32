use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::adapter::store::sqlite::connection_provider::{
    PooledConnection, SqliteConnectionProvider,
};
use crate::adapter::store::sqlite::sqlx_transaction::SqlxTransaction;
use crate::core::domain::command::CommandError;
use crate::core::domain::entity::member::member::{validate_member_id, validate_money};
use crate::core::domain::entity::member::{Member, MemberRepository};
use crate::core::domain::execution::{ExecutionContext, ExecutionMode};
use crate::core::domain::synchronizer::TransactionSynchronizer;
use crate::core::domain::transaction::TransactionError;

const INSERT_MEMBER: &str = "INSERT INTO member(member_id, money) VALUES (?, ?)";
const SELECT_MEMBER: &str = "SELECT * FROM member WHERE member_id = ?";
const UPDATE_MEMBER: &str = "UPDATE member SET money = ? WHERE member_id = ?";
const DELETE_MEMBER: &str = "DELETE FROM member WHERE member_id = ?";

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    member_id: String,
    money: i64,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            member_id: row.member_id,
            money: row.money,
        }
    }
}

/// Where a single statement runs: the caller's transaction, or a connection
/// borrowed for that one statement.
enum Lease {
    Joined(OwnedMutexGuard<SqlxTransaction>),
    AutoCommit(PooledConnection),
}

impl Lease {
    fn connection(&mut self) -> Result<&mut SqliteConnection, TransactionError> {
        match self {
            Lease::Joined(transaction) => transaction.connection(),
            Lease::AutoCommit(connection) => connection.connection(),
        }
    }
}

pub struct SqliteMemberRepository {
    provider: SqliteConnectionProvider,
    synchronizer: Arc<TransactionSynchronizer<SqlxTransaction>>,
    mode: ExecutionMode,
}

impl SqliteMemberRepository {
    pub fn new(
        provider: SqliteConnectionProvider,
        synchronizer: Arc<TransactionSynchronizer<SqlxTransaction>>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            provider,
            synchronizer,
            mode,
        }
    }

    async fn lease(&self, ctx: &ExecutionContext) -> Result<Lease, CommandError> {
        if let Some(transaction) = self.synchronizer.get_active(ctx) {
            return Ok(Lease::Joined(transaction.lock_owned().await));
        }
        if !self.mode.allows_auto_commit() {
            return Err(TransactionError::NoActiveTransaction(*ctx).into());
        }
        debug!(%ctx, "no active transaction, running on an auto-commit connection");
        let connection = self
            .provider
            .acquire()
            .await
            .map_err(TransactionError::from)?;
        Ok(Lease::AutoCommit(connection))
    }
}

fn translate(error: sqlx::Error, member_id: &str) -> CommandError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_unique_violation() || db_error.message().contains("UNIQUE constraint") {
            return CommandError::member_already_exists(member_id);
        }
        let primary_code = db_error
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);
        if matches!(primary_code, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) {
            return CommandError::ConcurrencyError {
                entity_type: "Member".to_string(),
            };
        }
    }
    CommandError::DatabaseError(error.to_string())
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn save(&self, ctx: &ExecutionContext, member: Member) -> Result<Member, CommandError> {
        validate_member_id(&member.member_id)?;
        validate_money(member.money)?;
        let mut lease = self.lease(ctx).await?;
        sqlx::query(INSERT_MEMBER)
            .bind(member.member_id.as_str())
            .bind(member.money)
            .execute(lease.connection()?)
            .await
            .map_err(|e| translate(e, &member.member_id))?;
        debug!(%ctx, member_id = %member.member_id, money = member.money, "member saved");
        Ok(member)
    }

    async fn find_by_id(
        &self,
        ctx: &ExecutionContext,
        member_id: &str,
    ) -> Result<Member, CommandError> {
        let mut lease = self.lease(ctx).await?;
        let mut rows = sqlx::query_as::<_, MemberRow>(SELECT_MEMBER)
            .bind(member_id)
            .fetch_all(lease.connection()?)
            .await
            .map_err(|e| translate(e, member_id))?;
        match rows.len() {
            0 => Err(CommandError::member_not_found(member_id)),
            1 => Ok(rows.swap_remove(0).into()),
            count => Err(CommandError::ambiguous_member(member_id, count)),
        }
    }

    async fn update(
        &self,
        ctx: &ExecutionContext,
        member_id: &str,
        money: i64,
    ) -> Result<(), CommandError> {
        validate_money(money)?;
        let mut lease = self.lease(ctx).await?;
        let result = sqlx::query(UPDATE_MEMBER)
            .bind(money)
            .bind(member_id)
            .execute(lease.connection()?)
            .await
            .map_err(|e| translate(e, member_id))?;
        if result.rows_affected() == 0 {
            return Err(CommandError::member_not_found(member_id));
        }
        debug!(%ctx, member_id, money, "member updated");
        Ok(())
    }

    async fn delete(&self, ctx: &ExecutionContext, member_id: &str) -> Result<(), CommandError> {
        let mut lease = self.lease(ctx).await?;
        let result = sqlx::query(DELETE_MEMBER)
            .bind(member_id)
            .execute(lease.connection()?)
            .await
            .map_err(|e| translate(e, member_id))?;
        if result.rows_affected() == 0 {
            return Err(CommandError::member_not_found(member_id));
        }
        debug!(%ctx, member_id, "member deleted");
        Ok(())
    }
}
