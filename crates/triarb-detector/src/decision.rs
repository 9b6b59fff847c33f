//! Signal decision: spread events to directional trade signals.

use std::sync::Arc;

use tracing::debug;
use triarb_core::{Direction, SpreadEvent, TradeSignal};
use triarb_risk::AccountState;
use triarb_telemetry::Metrics;

use crate::config::{DecisionConfig, StrengthScoring};

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Signal(TradeSignal),
    /// Exactly-zero spread: no direction, no signal.
    Flat,
    /// Trading is halted; the stage must stop.
    Halted,
}

/// Turns trade candidates into signals while the account is active.
pub struct SignalDecider {
    scoring: StrengthScoring,
    account: Arc<AccountState>,
    halted: bool,
}

impl SignalDecider {
    pub fn new(config: &DecisionConfig, account: Arc<AccountState>) -> Self {
        Self {
            scoring: config.scoring,
            account,
            halted: false,
        }
    }

    /// Decide on one spread event.
    ///
    /// Positive spread (quoted cross above synthetic) sells the cross;
    /// negative spread buys it. Once the account is seen inactive, every
    /// later call returns `Decision::Halted`.
    pub fn decide(&mut self, event: &SpreadEvent) -> Decision {
        if self.halted || !self.account.is_active() {
            self.halted = true;
            return Decision::Halted;
        }

        let Some(direction) = Direction::from_spread(event.spread) else {
            debug!("Zero spread, no signal");
            return Decision::Flat;
        };

        let strength = self.scoring.score(event.spread, event.threshold);
        let signal = TradeSignal::new(direction, event.spread, strength, event.timestamp);
        Metrics::signal_emitted(&direction.to_string());
        debug!(
            direction = %direction,
            spread = %event.spread,
            strength = %strength,
            "Signal emitted"
        );
        Decision::Signal(signal)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
