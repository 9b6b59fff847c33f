//! Execution configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Units traded per fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LotSizing {
    /// Constant notional.
    Fixed { notional: f64 },
    /// `capital × risk_fraction / pip_value`, from the account at fill time.
    RiskFraction { pip_value: f64 },
}

impl Default for LotSizing {
    fn default() -> Self {
        // One standard FX lot
        Self::Fixed { notional: 100_000.0 }
    }
}

impl LotSizing {
    pub fn notional(&self, capital: f64, risk_fraction: f64) -> f64 {
        match *self {
            Self::Fixed { notional } => notional,
            Self::RiskFraction { pip_value } => (capital * risk_fraction / pip_value).max(0.0),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Fixed { notional } if !(notional.is_finite() && notional > 0.0) => {
                Err(format!("notional ({notional}) must be positive"))
            }
            Self::RiskFraction { pip_value } if !(pip_value.is_finite() && pip_value > 0.0) => {
                Err(format!("pip_value ({pip_value}) must be positive"))
            }
            _ => Ok(()),
        }
    }
}

/// `[execution]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Simulated round-trip latency before each signal is processed.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Probability that an order fills.
    #[serde(default = "default_fill_probability")]
    pub fill_probability: f64,
    /// Mean slippage in price units (positive = adverse).
    #[serde(default = "default_slippage_mean")]
    pub slippage_mean: f64,
    #[serde(default = "default_slippage_std_dev")]
    pub slippage_std_dev: f64,
    #[serde(default)]
    pub sizing: LotSizing,
    /// RNG seed. Unset draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_latency_ms() -> u64 {
    10
}

fn default_fill_probability() -> f64 {
    0.95
}

fn default_slippage_mean() -> f64 {
    0.000_01
}

fn default_slippage_std_dev() -> f64 {
    0.000_02
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            fill_probability: default_fill_probability(),
            slippage_mean: default_slippage_mean(),
            slippage_std_dev: default_slippage_std_dev(),
            sizing: LotSizing::default(),
            seed: None,
        }
    }
}

impl ExecutionConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - fill_probability is outside [0, 1]
    /// - slippage_mean is not finite, or slippage_std_dev is negative
    /// - the lot sizing parameter is not positive
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(format!(
                "fill_probability ({}) must be in [0, 1]",
                self.fill_probability
            ));
        }
        if !self.slippage_mean.is_finite() {
            return Err(format!(
                "slippage_mean ({}) must be finite",
                self.slippage_mean
            ));
        }
        if !self.slippage_std_dev.is_finite() || self.slippage_std_dev < 0.0 {
            return Err(format!(
                "slippage_std_dev ({}) must be finite and non-negative",
                self.slippage_std_dev
            ));
        }
        self.sizing.validate()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}
