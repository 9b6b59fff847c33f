//! Spread events and trade signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction on the quoted cross-rate pair.
///
/// Positive spread (real cross above synthetic) sells the cross and buys the
/// synthetic legs; negative spread does the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Direction implied by a spread. Exactly zero has no direction.
    pub fn from_spread(spread: f64) -> Option<Self> {
        if spread > 0.0 {
            Some(Self::Sell)
        } else if spread < 0.0 {
            Some(Self::Buy)
        } else {
            None
        }
    }

    /// Returns 1.0 for buy, -1.0 for sell.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Trade candidate: a spread that crossed the adaptive threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadEvent {
    /// Real cross mid minus synthetic cross.
    pub spread: f64,
    /// Threshold in force when the spread was evaluated.
    pub threshold: f64,
    /// Rolling volatility of the spread, including this sample.
    pub volatility: f64,
    /// Timestamp of the tick that completed the computation.
    pub timestamp: DateTime<Utc>,
}

/// Directional trade signal. Immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    direction: Direction,
    spread: f64,
    strength: f64,
    timestamp: DateTime<Utc>,
}

impl TradeSignal {
    pub fn new(direction: Direction, spread: f64, strength: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            direction,
            spread,
            strength,
            timestamp,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Originating spread value.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Score assigned by the decision stage.
    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
