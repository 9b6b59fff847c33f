//! Prometheus metrics and structured logging for the triarb pipeline.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - In-process Prometheus metrics for ticks, spreads, signals, fills and halts

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
