//! Error types for dispatch queue operations.

use thiserror::Error;

/// Errors produced by dispatch components.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// Runtime construction failed.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
