//! Execution contexts and execution modes.
//!
//! An [`ExecutionContext`] is the logical caller identity a transaction is
//! tracked against. Each business operation creates one and passes it down to
//! every repository call; nested calls reuse the same value and therefore see
//! the same transaction.

use std::fmt;

use ulid::Ulid;

/// Identity of one logical caller (one request, one CLI command, one task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionContext(Ulid);

impl ExecutionContext {
    /// Create a fresh, unique execution context.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

/// How repository calls behave when no transaction is active for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Run the statement on a fresh auto-commit connection.
    #[default]
    AutoCommit,

    /// Refuse to run outside a transaction.
    RequireTransaction,
}

impl ExecutionMode {
    /// Whether statements may run without an enclosing transaction.
    pub fn allows_auto_commit(&self) -> bool {
        matches!(self, ExecutionMode::AutoCommit)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::AutoCommit => write!(f, "auto-commit"),
            ExecutionMode::RequireTransaction => write!(f, "require-transaction"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "auto-commit" | "autocommit" | "auto" => Ok(ExecutionMode::AutoCommit),
            "require-transaction" | "transactional" | "strict" => {
                Ok(ExecutionMode::RequireTransaction)
            }
            _ => Err(format!("unknown execution mode: {}", s)),
        }
    }
}
