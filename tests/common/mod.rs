#![allow(dead_code)]

use std::sync::Arc;

use member_tx::adapter::app_state::AppState;
use member_tx::adapter::config::AppConfig;
use member_tx::adapter::init::AppInitializer;
use member_tx::adapter::store::sqlite::connection_provider::PoolStatsSnapshot;
use member_tx::core::domain::entity::member::{Member, MemberRepository};
use member_tx::core::domain::execution::{ExecutionContext, ExecutionMode};
use member_tx::adapter::store::sqlite::transaction_manager::SqliteTransactionManager;
use tempfile::TempDir;

pub struct TestApp {
    pub state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    pub fn manager(&self) -> &SqliteTransactionManager {
        &self.state.transaction_manager
    }

    pub fn repository(&self) -> &dyn MemberRepository {
        &*self.state.member_repository
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.state.transaction_manager.provider().stats()
    }

    /// Read a member through a fresh transaction of its own.
    pub async fn balance(&self, member_id: &str) -> Option<i64> {
        let repository = self.repository();
        let id = member_id.to_string();
        self.manager()
            .run_transactional(&ExecutionContext::new(), |ctx| async move {
                repository.find_by_id(&ctx, &id).await
            })
            .await
            .ok()
            .map(|member| member.money)
    }

    pub async fn seed(&self, members: &[(&str, i64)]) {
        let repository = self.repository();
        for (id, money) in members {
            let member = Member::new(*id, *money);
            self.manager()
                .run_transactional(&ExecutionContext::new(), |ctx| async move {
                    repository.save(&ctx, member).await
                })
                .await
                .unwrap();
        }
    }
}

pub async fn setup(max_pool_size: u32, mode: ExecutionMode) -> TestApp {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("member.db").display());
    let config = AppConfig::default()
        .with_database_url(url)
        .with_max_pool_size(max_pool_size)
        .with_connect_timeout_ms(200)
        .with_execution_mode(mode);
    let state = AppInitializer::initialize(&config).await.unwrap();
    TestApp { state, _dir: dir }
}
