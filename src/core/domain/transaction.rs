use std::fmt;

use thiserror::Error;

use crate::core::domain::execution::ExecutionContext;

/// Lifecycle of a transaction context. `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Active)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "active"),
            TransactionStatus::Committed => write!(f, "committed"),
            TransactionStatus::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// Failures obtaining a connection from the pool.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection pool exhausted: no connection available within {timeout_ms}ms")]
    PoolExhausted { timeout_ms: u64 },
    #[error("Connection pool is closed")]
    PoolClosed,
    #[error("Failed to connect: {0}")]
    ConnectFailed(String),
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Failed to begin transaction: {0}")]
    BeginError(String),
    #[error("Failed to commit transaction: {0}")]
    CommitError(String),
    #[error("Failed to rollback transaction: {0}")]
    RollbackError(String),
    #[error("Cannot {operation} a transaction that is {status}")]
    InvalidStateTransition {
        status: TransactionStatus,
        operation: &'static str,
    },
    #[error("Execution context {0} already has an active transaction")]
    AlreadyRegistered(ExecutionContext),
    #[error("Connection was already released")]
    ConnectionReleased,
    #[error("No active transaction for execution context {0}")]
    NoActiveTransaction(ExecutionContext),
}

impl TransactionError {
    /// Pool or network failure; fatal to the current operation.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, TransactionError::Connection(_))
    }

    /// Misordered begin/commit/rollback or misuse of a released context.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            TransactionError::InvalidStateTransition { .. }
                | TransactionError::AlreadyRegistered(_)
                | TransactionError::ConnectionReleased
                | TransactionError::NoActiveTransaction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Active.is_terminal());
        assert!(TransactionStatus::Committed.is_terminal());
        assert!(TransactionStatus::RolledBack.is_terminal());
    }

    #[test]
    fn test_error_classification() {
        let exhausted = TransactionError::from(ConnectionError::PoolExhausted { timeout_ms: 50 });
        assert!(exhausted.is_connection_error());
        assert!(!exhausted.is_state_error());

        let twice = TransactionError::InvalidStateTransition {
            status: TransactionStatus::Committed,
            operation: "commit",
        };
        assert!(twice.is_state_error());
        assert_eq!(
            twice.to_string(),
            "Cannot commit a transaction that is committed"
        );
    }
}
