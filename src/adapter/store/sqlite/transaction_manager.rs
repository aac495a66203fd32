use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error};

use crate::adapter::store::sqlite::connection_provider::SqliteConnectionProvider;
use crate::adapter::store::sqlite::releaser::ResourceReleaser;
use crate::adapter::store::sqlite::sqlx_transaction::SqlxTransaction;
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::synchronizer::TransactionSynchronizer;
use crate::core::domain::transaction::TransactionError;
use crate::core::domain::transaction_manager::{TransactionManager, TransactionManagerError};
use crate::core::domain::transaction_operation::BoxedTransactionOperation;

pub struct SqliteTransactionManager {
    provider: SqliteConnectionProvider,
    synchronizer: Arc<TransactionSynchronizer<SqlxTransaction>>,
}

impl SqliteTransactionManager {
    pub fn new(
        provider: SqliteConnectionProvider,
        synchronizer: Arc<TransactionSynchronizer<SqlxTransaction>>,
    ) -> Self {
        Self {
            provider,
            synchronizer,
        }
    }

    pub fn provider(&self) -> &SqliteConnectionProvider {
        &self.provider
    }

    pub fn synchronizer(&self) -> &Arc<TransactionSynchronizer<SqlxTransaction>> {
        &self.synchronizer
    }

    /// Run `body` inside a transaction bound to `ctx`.
    ///
    /// If `ctx` already has a transaction the body joins it and its result is
    /// passed through; the outer call commits or rolls back. Otherwise a
    /// connection is acquired and a transaction begun and registered, then:
    ///
    /// - body `Ok` → commit, deregister, release. A commit error is returned
    ///   after the release.
    /// - body `Err` → rollback, deregister, release, `OperationError`. If the
    ///   rollback fails, `RollbackFailed` carries both errors.
    /// - body panics → rollback, deregister, release, then the panic resumes.
    pub async fn run_transactional<T, E, F, Fut>(
        &self,
        ctx: &ExecutionContext,
        body: F,
    ) -> Result<T, TransactionManagerError<E>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ctx = *ctx;
        if self.synchronizer.is_active(&ctx) {
            debug!(%ctx, "joining active transaction");
            return body(ctx).await.map_err(TransactionManagerError::OperationError);
        }

        let connection = self
            .provider
            .acquire()
            .await
            .map_err(TransactionError::from)?;
        let transaction = SqlxTransaction::begin(connection).await?;
        let shared = self.synchronizer.register(ctx, transaction)?;
        let releaser = ResourceReleaser::new(&self.synchronizer, ctx, shared);
        debug!(%ctx, "transaction started");

        let outcome = AssertUnwindSafe(body(ctx)).catch_unwind().await;

        let shared = releaser.transaction();
        let mut transaction = shared.lock().await;
        match outcome {
            Ok(Ok(value)) => {
                let committed = transaction.commit().await;
                releaser.finish(&mut transaction);
                match committed {
                    Ok(()) => Ok(value),
                    Err(e) => {
                        error!(%ctx, error = %e, "commit failed");
                        Err(e.into())
                    }
                }
            }
            Ok(Err(original)) => {
                let rolled_back = transaction.rollback().await;
                releaser.finish(&mut transaction);
                match rolled_back {
                    Ok(()) => {
                        debug!(%ctx, "transaction rolled back after operation error");
                        Err(TransactionManagerError::OperationError(original))
                    }
                    Err(rollback) => {
                        error!(%ctx, error = %rollback, "rollback failed after operation error");
                        Err(TransactionManagerError::RollbackFailed { rollback, original })
                    }
                }
            }
            Err(panic) => {
                if let Err(e) = transaction.rollback().await {
                    error!(%ctx, error = %e, "rollback failed after panic");
                }
                releaser.finish(&mut transaction);
                drop(transaction);
                std::panic::resume_unwind(panic)
            }
        }
    }
}

#[async_trait]
impl TransactionManager for SqliteTransactionManager {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        operation: Box<dyn BoxedTransactionOperation>,
    ) -> Result<(), TransactionManagerError> {
        self.run_transactional(ctx, |ctx| async move { operation.execute(&ctx).await })
            .await
    }
}
