//! Core domain types for the triangular arbitrage simulator.
//!
//! This crate provides the types shared by every pipeline stage:
//! - `Instrument`, `Tick`: Quoted FX pairs and immutable price ticks
//! - `SpreadEvent`, `TradeSignal`, `Direction`: Detection and decision outputs
//! - `TradeRecord`, `RunSummary`: Simulated fills and the end-of-run report
//! - `PipelineEvent`: Tagged payload moved through the event transport
//! - `ReplayMode`: Pacing policy for historical replay

pub mod error;
pub mod event;
pub mod replay;
pub mod signal;
pub mod tick;
pub mod trade;

pub use error::{CoreError, Result};
pub use event::PipelineEvent;
pub use replay::ReplayMode;
pub use signal::{Direction, SpreadEvent, TradeSignal};
pub use tick::{Instrument, QuoteState, Tick};
pub use trade::{RunSummary, TradeRecord};
