pub mod command;
pub mod entity;
pub mod execution;
pub mod synchronizer;
pub mod transaction;
pub mod transaction_manager;
pub mod transaction_operation;
