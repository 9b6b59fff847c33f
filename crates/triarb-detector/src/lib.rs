//! Cross-rate spread detection for triangular FX arbitrage.
//!
//! - `VolatilityWindow`: Rolling standard deviation over the last W samples,
//!   maintained incrementally
//! - `SpreadEstimator`: Synthetic cross from two legs, spread against the
//!   quoted cross, adaptive threshold `baseline + multiplier × volatility`
//! - `SignalDecider`: Spread events to directional trade signals, gated on
//!   the shared account
//! - `SpreadStage` / `DecisionStage`: Queue-driven loops around the above

pub mod config;
pub mod decision;
pub mod error;
pub mod spread;
pub mod stage;
pub mod volatility;

pub use config::{CrossRule, DecisionConfig, SpreadConfig, StrengthScoring};
pub use decision::{Decision, SignalDecider};
pub use error::{DetectorError, DetectorResult};
pub use spread::SpreadEstimator;
pub use stage::{DecisionStage, DecisionStats, SpreadStage, SpreadStats};
pub use volatility::VolatilityWindow;
