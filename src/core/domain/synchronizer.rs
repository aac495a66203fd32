//! Registry of active transactions, keyed by execution context.
//!
//! The outermost call registers its transaction. Callees look it up by the
//! same [`ExecutionContext`], and the owner clears the entry when it finishes.
//!
//! Entries are sharded per execution context. A context never observes a
//! transaction registered by another one.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace};

use crate::core::domain::execution::ExecutionContext;
use crate::core::domain::transaction::TransactionError;

/// Handle to a registered transaction. Nested callers hold a clone of the
/// handle, never a second transaction.
pub type SharedTransaction<T> = Arc<AsyncMutex<T>>;

pub struct TransactionSynchronizer<T> {
    active: Mutex<HashMap<ExecutionContext, SharedTransaction<T>>>,
}

impl<T> TransactionSynchronizer<T> {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
        }
    }

    /// The transaction currently bound to `ctx`, if any.
    pub fn get_active(&self, ctx: &ExecutionContext) -> Option<SharedTransaction<T>> {
        self.active.lock().get(ctx).cloned()
    }

    /// Bind `transaction` to `ctx`.
    ///
    /// Fails with [`TransactionError::AlreadyRegistered`] if `ctx` already has
    /// one; the rejected transaction is dropped.
    pub fn register(
        &self,
        ctx: ExecutionContext,
        transaction: T,
    ) -> Result<SharedTransaction<T>, TransactionError> {
        let mut active = self.active.lock();
        match active.entry(ctx) {
            Entry::Occupied(_) => Err(TransactionError::AlreadyRegistered(ctx)),
            Entry::Vacant(slot) => {
                let shared = Arc::new(AsyncMutex::new(transaction));
                slot.insert(Arc::clone(&shared));
                debug!(%ctx, "transaction registered");
                Ok(shared)
            }
        }
    }

    /// Remove the binding for `ctx`. Returns whether one existed; clearing an
    /// absent entry only logs.
    pub fn clear(&self, ctx: &ExecutionContext) -> bool {
        let removed = self.active.lock().remove(ctx).is_some();
        if removed {
            debug!(%ctx, "transaction deregistered");
        } else {
            trace!(%ctx, "clear requested for context without a transaction");
        }
        removed
    }

    pub fn is_active(&self, ctx: &ExecutionContext) -> bool {
        self.active.lock().contains_key(ctx)
    }

    /// Number of execution contexts with a registered transaction.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

impl<T> Default for TransactionSynchronizer<T> {
    fn default() -> Self {
        Self::new()
    }
}
