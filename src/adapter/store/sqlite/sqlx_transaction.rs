use std::time::Instant;

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::adapter::store::sqlite::connection_provider::PooledConnection;
use crate::core::domain::transaction::{TransactionError, TransactionStatus};

/// An open transaction on one pooled connection.
///
/// `Active -> Committed | RolledBack`. The connection is given back exactly
/// once through [`SqlxTransaction::release`] or on drop; a connection whose
/// transaction never finished is closed rather than returned to the pool.
pub struct SqlxTransaction {
    connection: PooledConnection,
    status: TransactionStatus,
    started_at: Instant,
}

impl SqlxTransaction {
    /// Turn auto-commit off on `connection` and enter `Active`.
    pub async fn begin(mut connection: PooledConnection) -> Result<Self, TransactionError> {
        let conn = connection.connection()?;
        if let Err(e) = sqlx::query("BEGIN").execute(conn).await {
            connection.discard();
            return Err(TransactionError::BeginError(e.to_string()));
        }
        Ok(Self {
            connection,
            status: TransactionStatus::Active,
            started_at: Instant::now(),
        })
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_released(&self) -> bool {
        self.connection.is_released()
    }

    /// The connection to run statements on. Only available while active.
    pub fn connection(&mut self) -> Result<&mut SqliteConnection, TransactionError> {
        if self.status.is_terminal() {
            return Err(TransactionError::InvalidStateTransition {
                status: self.status,
                operation: "execute on",
            });
        }
        self.connection.connection()
    }

    /// A failed `COMMIT` leaves the transaction active.
    pub async fn commit(&mut self) -> Result<(), TransactionError> {
        if self.status != TransactionStatus::Active {
            return Err(TransactionError::InvalidStateTransition {
                status: self.status,
                operation: "commit",
            });
        }
        let conn = self.connection.connection()?;
        sqlx::query("COMMIT")
            .execute(conn)
            .await
            .map_err(|e| TransactionError::CommitError(e.to_string()))?;
        self.status = TransactionStatus::Committed;
        debug!(elapsed_ms = self.started_at.elapsed().as_millis() as u64, "transaction committed");
        Ok(())
    }

    /// No-op once the transaction is finished. A failed `ROLLBACK` leaves the
    /// transaction active.
    pub async fn rollback(&mut self) -> Result<(), TransactionError> {
        match self.status {
            TransactionStatus::Committed => {
                warn!("rollback requested after commit, ignoring");
                return Ok(());
            }
            TransactionStatus::RolledBack => return Ok(()),
            TransactionStatus::Active => {}
        }
        let conn = self.connection.connection()?;
        sqlx::query("ROLLBACK")
            .execute(conn)
            .await
            .map_err(|e| TransactionError::RollbackError(e.to_string()))?;
        self.status = TransactionStatus::RolledBack;
        debug!(elapsed_ms = self.started_at.elapsed().as_millis() as u64, "transaction rolled back");
        Ok(())
    }

    /// Give the connection back. Still-active transactions get their
    /// connection closed so the store discards the uncommitted work.
    pub fn release(&mut self) {
        if self.connection.is_released() {
            return;
        }
        if self.status == TransactionStatus::Active {
            warn!("releasing connection of an unfinished transaction, closing it");
            self.connection.discard();
        } else {
            self.connection.release();
        }
    }
}

impl Drop for SqlxTransaction {
    fn drop(&mut self) {
        self.release();
    }
}
