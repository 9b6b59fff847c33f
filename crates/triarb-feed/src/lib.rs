//! Event transport, tick sources and replay pacing.
//!
//! - `EventQueue`: Non-blocking multi-producer/multi-consumer FIFO between stages
//! - `TickSource`: Lazy, restartable sequence of parsed ticks (in-memory or CSV)
//! - `TickReplayer`: Tick source stage that paces ticks by `ReplayMode`

pub mod bus;
pub mod csv;
pub mod error;
pub mod replay;
pub mod source;

pub use bus::{EventQueue, Poll, IDLE_BACKOFF};
pub use csv::CsvTickSource;
pub use error::{FeedError, FeedResult};
pub use replay::{replayer_from_config, FeedConfig, ReplayPacing, ReplayStats, TickReplayer};
pub use source::{TickSource, VecTickSource};
