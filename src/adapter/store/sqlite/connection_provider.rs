//! Connection acquisition on top of the sqlx pool.
//!
//! Every connection handed out is wrapped in a [`PooledConnection`] that gives
//! it back exactly once, either explicitly or when dropped. [`PoolStats`]
//! counts both sides so the one-release-per-acquire guarantee can be checked.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{trace, warn};

use crate::core::domain::transaction::{ConnectionError, TransactionError};

#[derive(Debug, Default)]
pub struct PoolStats {
    acquired: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
            discarded: self.discarded.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time counters. `released` includes `discarded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatsSnapshot {
    pub acquired: u64,
    pub released: u64,
    pub discarded: u64,
}

impl PoolStatsSnapshot {
    /// Connections acquired and not yet released.
    pub fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Clone)]
pub struct SqliteConnectionProvider {
    pool: SqlitePool,
    acquire_timeout: Duration,
    stats: Arc<PoolStats>,
}

impl SqliteConnectionProvider {
    pub fn new(pool: SqlitePool, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            acquire_timeout,
            stats: Arc::new(PoolStats::default()),
        }
    }

    /// Take a connection from the pool. No retry: exhaustion and connect
    /// failures are returned as they happen.
    pub async fn acquire(&self) -> Result<PooledConnection, ConnectionError> {
        match self.pool.acquire().await {
            Ok(connection) => {
                self.stats.acquired.fetch_add(1, Ordering::SeqCst);
                trace!(
                    size = self.pool.size(),
                    idle = self.pool.num_idle(),
                    "connection acquired"
                );
                Ok(PooledConnection::new(connection, Arc::clone(&self.stats)))
            }
            Err(sqlx::Error::PoolTimedOut) => {
                let timeout_ms = self.acquire_timeout.as_millis() as u64;
                warn!(timeout_ms, "connection pool exhausted");
                Err(ConnectionError::PoolExhausted { timeout_ms })
            }
            Err(sqlx::Error::PoolClosed) => Err(ConnectionError::PoolClosed),
            Err(e) => Err(ConnectionError::ConnectFailed(e.to_string())),
        }
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A connection checked out of the pool.
pub struct PooledConnection {
    inner: Option<PoolConnection<Sqlite>>,
    stats: Arc<PoolStats>,
}

impl PooledConnection {
    fn new(inner: PoolConnection<Sqlite>, stats: Arc<PoolStats>) -> Self {
        Self {
            inner: Some(inner),
            stats,
        }
    }

    pub fn connection(&mut self) -> Result<&mut SqliteConnection, TransactionError> {
        self.inner
            .as_deref_mut()
            .ok_or(TransactionError::ConnectionReleased)
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Return the connection to the pool. Later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(connection) = self.inner.take() {
            drop(connection);
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            trace!("connection released");
        }
    }

    /// Close the connection instead of returning it. Used when it may still
    /// be inside an open transaction. Later calls are no-ops.
    pub fn discard(&mut self) {
        if let Some(connection) = self.inner.take() {
            drop(connection.detach());
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            self.stats.discarded.fetch_add(1, Ordering::SeqCst);
            trace!("connection discarded");
        }
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("released", &self.is_released())
            .finish()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.release();
    }
}
