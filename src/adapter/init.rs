use crate::adapter::app_state::AppState;
use crate::adapter::config::AppConfig;
use crate::adapter::store::sqlite::command::member::SqliteMemberRepository;
use crate::adapter::store::sqlite::connection_provider::SqliteConnectionProvider;
use crate::adapter::store::sqlite::database::{ensure_schema, open_pool};
use crate::adapter::store::sqlite::transaction_manager::SqliteTransactionManager;
use crate::core::domain::synchronizer::TransactionSynchronizer;
use crate::core::use_case::register_member::RegisterMemberUseCase;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub struct AppInitializer;

impl AppInitializer {
    pub async fn initialize(config: &AppConfig) -> Result<Arc<AppState>, AppInitializerError> {
        let pool = open_pool(
            config.database_url(),
            config.max_pool_size(),
            config.connect_timeout(),
        )
        .await
        .map_err(|e| AppInitializerError::DatabaseInitError(e.to_string()))?;
        ensure_schema(&pool)
            .await
            .map_err(|e| AppInitializerError::SchemaError(e.to_string()))?;

        let provider = SqliteConnectionProvider::new(pool.clone(), config.connect_timeout());
        let synchronizer = Arc::new(TransactionSynchronizer::new());
        let transaction_manager = Arc::new(SqliteTransactionManager::new(
            provider.clone(),
            synchronizer.clone(),
        ));
        let member_repository = Arc::new(SqliteMemberRepository::new(
            provider,
            synchronizer,
            config.execution_mode(),
        ));
        let register_member_use_case = Arc::new(RegisterMemberUseCase::new(
            member_repository.clone(),
            transaction_manager.clone(),
        ));
        info!(
            database_url = config.database_url(),
            max_pool_size = config.max_pool_size(),
            execution_mode = %config.execution_mode(),
            "application initialized"
        );

        Ok(Arc::new(AppState {
            pool,
            transaction_manager,
            member_repository,
            register_member_use_case,
        }))
    }
}

#[derive(Debug, Error)]
pub enum AppInitializerError {
    #[error("Failed to initialize database: {0}")]
    DatabaseInitError(String),
    #[error("Failed to create schema: {0}")]
    SchemaError(String),
}
