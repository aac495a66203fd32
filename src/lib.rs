//! Transactional resource management for a member ledger on SQLite.
//!
//! A business operation opens a transaction with
//! [`SqliteTransactionManager::run_transactional`]; repositories called with
//! the same [`ExecutionContext`] join it instead of acquiring their own
//! connection, and the connection goes back to the pool exactly once however
//! the operation ends.
//!
//! [`SqliteTransactionManager::run_transactional`]: crate::adapter::store::sqlite::transaction_manager::SqliteTransactionManager::run_transactional
//! [`ExecutionContext`]: crate::core::domain::execution::ExecutionContext

pub mod adapter;
pub mod core;
pub mod error;
