//! Cross-rate spread estimator.
//!
//! Keeps the latest mid for each instrument of the triangle. Once all three
//! have been seen, every relevant tick recomputes:
//!
//! - `synthetic = rule(mid(leg0), mid(leg1))`
//! - `spread = mid(target) - synthetic`
//! - `threshold = baseline + multiplier × volatility`, with the new sample
//!   already in the volatility window
//!
//! and emits a `SpreadEvent` when `|spread| > threshold`.

use tracing::{debug, trace};
use triarb_core::{SpreadEvent, Tick};
use triarb_telemetry::Metrics;

use crate::config::SpreadConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::volatility::VolatilityWindow;

const TARGET: usize = 0;
const LEG0: usize = 1;
const LEG1: usize = 2;

/// Spread estimator state. Owned by a single stage.
#[derive(Debug)]
pub struct SpreadEstimator {
    config: SpreadConfig,
    /// Latest mid per slot: target, leg0, leg1.
    mids: [Option<f64>; 3],
    window: VolatilityWindow,
    last_spread: Option<f64>,
    last_threshold: f64,
}

impl SpreadEstimator {
    pub fn new(config: SpreadConfig) -> DetectorResult<Self> {
        config.validate().map_err(DetectorError::ConfigError)?;
        let window = VolatilityWindow::new(config.window_size)?;
        let last_threshold = config.baseline_threshold;
        Ok(Self {
            config,
            mids: [None; 3],
            window,
            last_spread: None,
            last_threshold,
        })
    }

    fn slot(&self, tick: &Tick) -> Option<usize> {
        let instrument = tick.instrument();
        if instrument == &self.config.target {
            Some(TARGET)
        } else if instrument == &self.config.legs[0] {
            Some(LEG0)
        } else if instrument == &self.config.legs[1] {
            Some(LEG1)
        } else {
            None
        }
    }

    /// Update with a tick. Returns a trade candidate if the threshold is crossed.
    pub fn on_tick(&mut self, tick: &Tick) -> Option<SpreadEvent> {
        let Some(slot) = self.slot(tick) else {
            trace!(instrument = %tick.instrument(), "Ignoring tick outside triangle");
            return None;
        };
        self.mids[slot] = Some(tick.mid());

        let [Some(target), Some(leg0), Some(leg1)] = self.mids else {
            return None;
        };

        let Some(synthetic) = self.config.rule.combine(leg0, leg1) else {
            debug!(leg0, leg1, "Synthetic cross undefined, skipping");
            return None;
        };
        let spread = target - synthetic;

        self.window.add_sample(spread);
        let volatility = self.window.volatility();
        let threshold =
            self.config.baseline_threshold + self.config.volatility_multiplier * volatility;
        self.last_spread = Some(spread);
        self.last_threshold = threshold;
        Metrics::spread_sample(spread, volatility, threshold);

        if spread.abs() <= threshold {
            trace!(spread, threshold, "Spread within threshold");
            return None;
        }

        debug!(
            spread = %spread,
            threshold = %threshold,
            volatility = %volatility,
            synthetic = %synthetic,
            "Spread threshold crossed"
        );
        Metrics::spread_event();
        Some(SpreadEvent {
            spread,
            threshold,
            volatility,
            timestamp: tick.timestamp(),
        })
    }

    /// True once every instrument of the triangle has been seen.
    pub fn is_primed(&self) -> bool {
        self.mids.iter().all(Option::is_some)
    }

    /// Current rolling volatility of the spread.
    pub fn volatility(&self) -> f64 {
        self.window.volatility()
    }

    /// Threshold from the most recent computation (baseline before any).
    pub fn threshold(&self) -> f64 {
        self.last_threshold
    }

    pub fn last_spread(&self) -> Option<f64> {
        self.last_spread
    }

    pub fn samples(&self) -> usize {
        self.window.len()
    }

    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }
}
