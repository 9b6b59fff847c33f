//! Triangular FX arbitrage replay simulator.
//!
//! Wires the pipeline stages together:
//! - Tick replay from a historical CSV file
//! - Cross-rate spread estimation with an adaptive threshold
//! - Signal decision gated on the shared account
//! - Simulated execution and trade logging
//! - Periodic risk monitoring with a terminal halt

pub mod app;
pub mod config;
pub mod error;

pub use app::{Pipeline, RunReport};
pub use config::{AppConfig, ConfigOverrides};
pub use error::{AppError, AppResult};
