pub mod command;
pub mod connection_provider;
pub mod database;
mod releaser;
pub mod sqlx_transaction;
pub mod transaction_manager;
