use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapter::store::sqlite::transaction_manager::SqliteTransactionManager;
use crate::core::domain::entity::member::MemberRepository;
use crate::core::port::register_member::RegisterMemberInputBoundary;

pub struct AppState {
    pub pool: SqlitePool,
    pub transaction_manager: Arc<SqliteTransactionManager>,
    pub member_repository: Arc<dyn MemberRepository>,
    pub register_member_use_case: Arc<dyn RegisterMemberInputBoundary>,
}

impl AppState {
    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
