pub mod app_state;
pub mod cli;
pub mod config;
pub mod init;
pub mod store;
pub mod telemetry;
