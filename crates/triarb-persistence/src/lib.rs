//! Trade sinks for triarb.
//!
//! Completed trade records are handed to a `TradeSink` exactly once, in
//! execution order, followed by a single end-of-run summary.

pub mod error;
pub mod sink;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use sink::{InMemorySink, TradeSink};
pub use writer::{JsonLinesTradeWriter, PersistenceConfig};
