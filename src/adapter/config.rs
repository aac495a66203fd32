use std::time::Duration;

use crate::core::domain::execution::ExecutionMode;
use crate::error::ApplicationError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://member.db";
pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

pub const ENV_DATABASE_URL: &str = "MEMBER_TX_DATABASE_URL";
pub const ENV_MAX_POOL_SIZE: &str = "MEMBER_TX_MAX_POOL_SIZE";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "MEMBER_TX_CONNECT_TIMEOUT_MS";
pub const ENV_EXECUTION_MODE: &str = "MEMBER_TX_EXECUTION_MODE";

#[derive(Debug, Clone)]
pub struct AppConfig {
    database_url: String,
    max_pool_size: u32,
    connect_timeout_ms: u64,
    execution_mode: ExecutionMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            execution_mode: ExecutionMode::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self, ApplicationError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    /// Ranges are not checked here, call [`AppConfig::validate`] once all
    /// overrides are applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApplicationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database_url = url;
        }
        if let Some(size) = lookup(ENV_MAX_POOL_SIZE) {
            config.max_pool_size = parse_number(ENV_MAX_POOL_SIZE, &size)?;
        }
        if let Some(timeout) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout_ms = parse_number(ENV_CONNECT_TIMEOUT_MS, &timeout)?;
        }
        if let Some(mode) = lookup(ENV_EXECUTION_MODE) {
            config.execution_mode = mode
                .parse::<ExecutionMode>()
                .map_err(ApplicationError::ConfigurationError)?;
        }
        Ok(config)
    }

    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    pub fn with_max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }

    pub fn with_connect_timeout_ms(mut self, connect_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self
    }

    pub fn with_execution_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.database_url.trim().is_empty() {
            return Err(ApplicationError::ConfigurationError(
                "database url must not be empty".to_string(),
            ));
        }
        if self.max_pool_size == 0 {
            return Err(ApplicationError::ConfigurationError(
                "max pool size must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ApplicationError::ConfigurationError(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_pool_size(&self) -> u32 {
        self.max_pool_size
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApplicationError> {
    value.trim().parse().map_err(|_| {
        ApplicationError::ConfigurationError(format!("{} is not a valid number: {}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(config.max_pool_size(), DEFAULT_MAX_POOL_SIZE);
        assert_eq!(config.connect_timeout(), Duration::from_millis(3_000));
        assert_eq!(config.execution_mode(), ExecutionMode::AutoCommit);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "sqlite::memory:"),
            (ENV_MAX_POOL_SIZE, "2"),
            (ENV_CONNECT_TIMEOUT_MS, " 250 "),
            (ENV_EXECUTION_MODE, "require-transaction"),
        ]))
        .unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.max_pool_size(), 2);
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.execution_mode(), ExecutionMode::RequireTransaction);
    }

    #[test]
    fn test_rejects_zero_pool_size() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_MAX_POOL_SIZE, "0")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max pool size"));
    }

    #[test]
    fn test_override_repairs_invalid_environment_value() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_MAX_POOL_SIZE, "0")]))
            .unwrap()
            .with_max_pool_size(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_pool_size(), 3);
    }

    #[test]
    fn test_rejects_garbage_numbers_and_modes() {
        assert!(AppConfig::from_lookup(lookup(&[(ENV_CONNECT_TIMEOUT_MS, "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(ENV_EXECUTION_MODE, "yolo")])).is_err());
    }

    #[test]
    fn test_builder_then_validate() {
        let config = AppConfig::default()
            .with_database_url("sqlite://other.db")
            .with_max_pool_size(1)
            .with_connect_timeout_ms(10)
            .with_execution_mode(ExecutionMode::RequireTransaction);
        assert!(config.validate().is_ok());
        assert!(config.with_connect_timeout_ms(0).validate().is_err());
    }
}
