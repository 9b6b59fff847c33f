//! Tick source abstraction.

use triarb_core::Tick;

use crate::error::FeedResult;

/// Lazy, finite sequence of parsed ticks.
///
/// Sources are restartable per run: `rewind` resets the sequence to its
/// first tick. Malformed records are handled inside the source and never
/// surface as ticks.
pub trait TickSource: Send {
    /// Next tick, or `None` when the sequence is exhausted.
    fn next_tick(&mut self) -> FeedResult<Option<Tick>>;

    /// Restart the sequence from the beginning.
    fn rewind(&mut self) -> FeedResult<()>;

    /// Human-readable description for logging.
    fn describe(&self) -> String;
}

/// In-memory tick source.
#[derive(Debug, Clone)]
pub struct VecTickSource {
    ticks: Vec<Tick>,
    cursor: usize,
}

impl VecTickSource {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self { ticks, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

impl TickSource for VecTickSource {
    fn next_tick(&mut self) -> FeedResult<Option<Tick>> {
        let tick = self.ticks.get(self.cursor).cloned();
        if tick.is_some() {
            self.cursor += 1;
        }
        Ok(tick)
    }

    fn rewind(&mut self) -> FeedResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} ticks)", self.ticks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_vec_source_rewind() {
        let ts = DateTime::from_timestamp_millis(0).unwrap();
        let mut source = VecTickSource::new(vec![
            Tick::new("EUR/USD", 1.1, 1.1002, ts),
            Tick::new("GBP/USD", 1.3, 1.3002, ts),
        ]);

        assert_eq!(source.next_tick().unwrap().unwrap().instrument().as_str(), "EUR/USD");
        assert_eq!(source.next_tick().unwrap().unwrap().instrument().as_str(), "GBP/USD");
        assert!(source.next_tick().unwrap().is_none());

        source.rewind().unwrap();
        assert_eq!(source.next_tick().unwrap().unwrap().instrument().as_str(), "EUR/USD");
    }
}
