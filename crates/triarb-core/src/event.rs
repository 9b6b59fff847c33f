//! Tagged payload moved through the event transport.

use serde::{Deserialize, Serialize};

use crate::signal::{SpreadEvent, TradeSignal};
use crate::tick::Tick;

/// Event exchanged between pipeline stages.
///
/// Each stage accepts exactly one variant. Receiving any other variant means
/// the queues were wired incorrectly, and the stage panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Tick(Tick),
    Spread(SpreadEvent),
    Signal(TradeSignal),
}

impl PipelineEvent {
    /// Variant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tick(_) => "tick",
            Self::Spread(_) => "spread",
            Self::Signal(_) => "signal",
        }
    }
}

impl From<Tick> for PipelineEvent {
    fn from(tick: Tick) -> Self {
        Self::Tick(tick)
    }
}

impl From<SpreadEvent> for PipelineEvent {
    fn from(event: SpreadEvent) -> Self {
        Self::Spread(event)
    }
}

impl From<TradeSignal> for PipelineEvent {
    fn from(signal: TradeSignal) -> Self {
        Self::Signal(signal)
    }
}
