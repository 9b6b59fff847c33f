//! Executor error types.

use thiserror::Error;
use triarb_persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Trade sink error: {0}")]
    Sink(#[from] PersistenceError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
