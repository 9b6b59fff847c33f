//! Trade sink abstraction.

use std::sync::Arc;

use parking_lot::Mutex;
use triarb_core::{RunSummary, TradeRecord};

use crate::error::{PersistenceError, PersistenceResult};

/// Receiver of completed trades.
///
/// `record` is called once per fill in execution order; `finish` is called
/// once at the end of the run.
pub trait TradeSink: Send {
    fn record(&mut self, record: &TradeRecord) -> PersistenceResult<()>;

    fn finish(&mut self, summary: &RunSummary) -> PersistenceResult<()>;
}

#[derive(Debug, Default)]
struct Captured {
    records: Vec<TradeRecord>,
    summary: Option<RunSummary>,
}

/// Sink that keeps everything in memory. Clones share the same storage, so a
/// test can keep one handle and give the other to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    inner: Arc<Mutex<Captured>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TradeRecord> {
        self.inner.lock().records.clone()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.inner.lock().summary.clone()
    }
}

impl TradeSink for InMemorySink {
    fn record(&mut self, record: &TradeRecord) -> PersistenceResult<()> {
        let mut inner = self.inner.lock();
        if inner.summary.is_some() {
            return Err(PersistenceError::Finished);
        }
        inner.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> PersistenceResult<()> {
        let mut inner = self.inner.lock();
        if inner.summary.is_some() {
            return Err(PersistenceError::Finished);
        }
        inner.summary = Some(summary.clone());
        Ok(())
    }
}

impl<S: TradeSink + ?Sized> TradeSink for Box<S> {
    fn record(&mut self, record: &TradeRecord) -> PersistenceResult<()> {
        (**self).record(record)
    }

    fn finish(&mut self, summary: &RunSummary) -> PersistenceResult<()> {
        (**self).finish(summary)
    }
}
