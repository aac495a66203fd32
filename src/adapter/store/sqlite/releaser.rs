use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapter::store::sqlite::sqlx_transaction::SqlxTransaction;
use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::synchronizer::{SharedTransaction, TransactionSynchronizer};

/// Scope guard owned by the call that opened a transaction.
///
/// [`ResourceReleaser::finish`] deregisters and releases once the transaction
/// has been committed or rolled back. If the owning future is dropped first
/// (cancellation), `Drop` does the same synchronously; the connection of the
/// unfinished transaction is closed rather than returned to the pool.
pub(crate) struct ResourceReleaser<'a> {
    synchronizer: &'a TransactionSynchronizer<SqlxTransaction>,
    ctx: ExecutionContext,
    transaction: SharedTransaction<SqlxTransaction>,
    finished: bool,
}

impl<'a> ResourceReleaser<'a> {
    pub(crate) fn new(
        synchronizer: &'a TransactionSynchronizer<SqlxTransaction>,
        ctx: ExecutionContext,
        transaction: SharedTransaction<SqlxTransaction>,
    ) -> Self {
        Self {
            synchronizer,
            ctx,
            transaction,
            finished: false,
        }
    }

    pub(crate) fn transaction(&self) -> SharedTransaction<SqlxTransaction> {
        Arc::clone(&self.transaction)
    }

    /// Deregister, then give the connection back.
    pub(crate) fn finish(mut self, transaction: &mut SqlxTransaction) {
        self.synchronizer.clear(&self.ctx);
        transaction.release();
        self.finished = true;
        debug!(ctx = %self.ctx, status = %transaction.status(), "transaction resources released");
    }
}

impl Drop for ResourceReleaser<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(ctx = %self.ctx, "transaction scope abandoned before completion");
        self.synchronizer.clear(&self.ctx);
        match self.transaction.try_lock() {
            Ok(mut transaction) => transaction.release(),
            // Whoever holds the lock drops the last handle, and with it the
            // connection.
            Err(_) => debug!(ctx = %self.ctx, "transaction still borrowed, release deferred"),
        }
    }
}
