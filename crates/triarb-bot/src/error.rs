//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] triarb_feed::FeedError),

    #[error("Detector error: {0}")]
    Detector(#[from] triarb_detector::DetectorError),

    #[error("Risk error: {0}")]
    Risk(#[from] triarb_risk::RiskError),

    #[error("Executor error: {0}")]
    Executor(#[from] triarb_executor::ExecutorError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] triarb_persistence::PersistenceError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] triarb_telemetry::TelemetryError),

    #[error("Stage task failed: {0}")]
    Join(String),
}

pub type AppResult<T> = Result<T, AppError>;
