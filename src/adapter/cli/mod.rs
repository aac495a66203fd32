pub mod handler;
pub mod presenter;

use clap::{Parser, Subcommand};

use crate::adapter::config::AppConfig;
use crate::core::domain::execution::ExecutionMode;

#[derive(Debug, Parser)]
#[command(name = "member-tx", version, about = "Transactional member ledger on SQLite")]
pub struct Cli {
    /// Database URL, e.g. sqlite://member.db
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Maximum number of pooled connections
    #[arg(long, global = true)]
    pub pool_size: Option<u32>,

    /// Milliseconds to wait for a pooled connection
    #[arg(long, global = true)]
    pub connect_timeout_ms: Option<u64>,

    /// Refuse repository calls that are not inside a transaction
    #[arg(long, global = true)]
    pub require_transaction: bool,

    /// Print members as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register a new member
    Save { member_id: String, money: i64 },
    /// Show one member
    Find { member_id: String },
    /// Set a member's balance
    Update { member_id: String, money: i64 },
    /// Add to (or, with a negative amount, take from) a member's balance
    Deposit {
        member_id: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Remove a member
    Delete { member_id: String },
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(url) = &self.database_url {
            config = config.with_database_url(url.clone());
        }
        if let Some(size) = self.pool_size {
            config = config.with_max_pool_size(size);
        }
        if let Some(timeout) = self.connect_timeout_ms {
            config = config.with_connect_timeout_ms(timeout);
        }
        if self.require_transaction {
            config = config.with_execution_mode(ExecutionMode::RequireTransaction);
        }
        config
    }
}
