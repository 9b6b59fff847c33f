//! Simulated fills and the end-of-run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::Direction;

/// Realized result of one simulated fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Fill sequence number within the run, starting at 1.
    pub seq: u64,
    /// Timestamp of the originating signal.
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    /// Originating spread.
    pub spread: f64,
    /// Signal strength.
    pub strength: f64,
    /// Slippage drawn for this fill (positive = adverse).
    pub slippage: f64,
    /// Edge captured after slippage, in price units.
    pub effective_edge: f64,
    /// Units traded.
    pub notional: f64,
    /// Realized profit (negative = loss).
    pub profit: f64,
    pub win: bool,
    /// Account capital after this fill.
    pub capital_after: f64,
}

/// End-of-run report handed to the trade sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub peak_capital: f64,
    /// Largest peak-to-trough decline observed, in capital units.
    pub max_drawdown: f64,
    /// Orders that failed the fill-probability draw.
    pub rejected_fills: u64,
    /// Signals discarded because trading was halted.
    pub skipped_signals: u64,
    pub halted: bool,
    pub halt_reason: Option<String>,
}

impl RunSummary {
    /// Average profit per fill.
    pub fn average_profit(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.total_pnl / self.total_trades as f64
        }
    }
}
