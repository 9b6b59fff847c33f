//! Instrument identifiers and price ticks.
//!
//! A `Tick` is the top-of-book quote for one FX pair at one instant.
//! Ticks are immutable once created; the mid price is derived on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// FX pair identifier, e.g. `EUR/USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    /// Create an instrument from its symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for Instrument {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

/// Quote state of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    /// Both sides present, finite and bid <= ask.
    Valid,
    /// Bid is zero, negative or missing.
    NoBid,
    /// Ask is zero, negative or missing.
    NoAsk,
    /// Both sides missing.
    Empty,
    /// Bid above ask.
    Crossed,
}

impl QuoteState {
    /// Check if this state can be used for pricing.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for QuoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::NoBid => write!(f, "NO_BID"),
            Self::NoAsk => write!(f, "NO_ASK"),
            Self::Empty => write!(f, "EMPTY"),
            Self::Crossed => write!(f, "CROSSED"),
        }
    }
}

/// Top-of-book quote for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    instrument: Instrument,
    bid: f64,
    ask: f64,
    timestamp: DateTime<Utc>,
}

impl Tick {
    /// Create a tick without validating the quote.
    pub fn new(
        instrument: impl Into<Instrument>,
        bid: f64,
        ask: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            bid,
            ask,
            timestamp,
        }
    }

    /// Create a tick, rejecting quotes that are not `QuoteState::Valid`.
    pub fn checked(
        instrument: impl Into<Instrument>,
        bid: f64,
        ask: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let tick = Self::new(instrument, bid, ask, timestamp);
        match tick.state() {
            QuoteState::Valid => Ok(tick),
            state => Err(CoreError::InvalidQuote(format!(
                "{} bid={} ask={} ({})",
                tick.instrument, bid, ask, state
            ))),
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn bid(&self) -> f64 {
        self.bid
    }

    pub fn ask(&self) -> f64 {
        self.ask
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Mid price: (bid + ask) / 2.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Quoted spread: ask - bid.
    pub fn quoted_spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Classify the quote.
    pub fn state(&self) -> QuoteState {
        let has_bid = self.bid.is_finite() && self.bid > 0.0;
        let has_ask = self.ask.is_finite() && self.ask > 0.0;

        match (has_bid, has_ask) {
            (false, false) => QuoteState::Empty,
            (true, false) => QuoteState::NoAsk,
            (false, true) => QuoteState::NoBid,
            (true, true) => {
                if self.bid <= self.ask {
                    QuoteState::Valid
                } else {
                    QuoteState::Crossed
                }
            }
        }
    }
}
