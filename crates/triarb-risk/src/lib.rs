//! Account risk state for the triarb pipeline.
//!
//! - `AccountState`: The only state shared across stages. Capital, peak,
//!   drawdown and the halt latch, behind narrow operations
//! - `HaltLatch`: Terminal trading halt. Once triggered, never reset within a run
//! - `RiskMonitor`: Periodic boundary check that forces the halt and
//!   cancels the run-control token

pub mod account;
pub mod error;
pub mod halt;
pub mod monitor;

pub use account::{AccountConfig, AccountSnapshot, AccountState, BoundaryRule};
pub use error::{RiskError, RiskResult};
pub use halt::{HaltLatch, HaltReason};
pub use monitor::{RiskMonitor, RiskMonitorConfig};
