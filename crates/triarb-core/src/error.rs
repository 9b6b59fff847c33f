//! Error types for triarb-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Unknown replay mode: {0}")]
    UnknownReplayMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
