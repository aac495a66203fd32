use thiserror::Error;

use crate::adapter::init::AppInitializerError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Failed to initialize application state: {0}")]
    InitializationError(#[from] AppInitializerError),
}
