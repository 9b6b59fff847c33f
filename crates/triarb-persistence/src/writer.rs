//! JSON Lines trade writer.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete `TradeRecord`
//! - Partial file corruption only affects individual lines
//! - Can be read even if the run was interrupted
//!
//! Each run writes `trades_<run_id>.jsonl` and, at finish,
//! `summary_<run_id>.json` into the output directory.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use triarb_core::{RunSummary, TradeRecord};

use crate::error::{PersistenceError, PersistenceResult};
use crate::sink::TradeSink;

/// `[persistence]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Records buffered before a flush.
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_max_buffer_size() -> usize {
    100
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

impl PersistenceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_buffer_size == 0 {
            return Err("max_buffer_size must be positive".to_string());
        }
        Ok(())
    }
}

/// Buffered JSON Lines writer for trade records.
pub struct JsonLinesTradeWriter {
    output_dir: PathBuf,
    run_id: String,
    buffer: Vec<TradeRecord>,
    max_buffer_size: usize,
    writer: Option<BufWriter<File>>,
    records_written: usize,
    finished: bool,
}

impl JsonLinesTradeWriter {
    /// Create the writer, creating the output directory if needed.
    ///
    /// The trades file is opened lazily on the first flush.
    pub fn new(output_dir: impl AsRef<Path>, max_buffer_size: usize) -> PersistenceResult<Self> {
        let run_id = Utc::now().format("%Y%m%d_%H%M%S%3f").to_string();
        Self::with_run_id(output_dir, max_buffer_size, run_id)
    }

    pub fn with_run_id(
        output_dir: impl AsRef<Path>,
        max_buffer_size: usize,
        run_id: impl Into<String>,
    ) -> PersistenceResult<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        let max_buffer_size = max_buffer_size.max(1);

        Ok(Self {
            output_dir,
            run_id: run_id.into(),
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size,
            writer: None,
            records_written: 0,
            finished: false,
        })
    }

    pub fn from_config(config: &PersistenceConfig) -> PersistenceResult<Self> {
        Self::new(&config.output_dir, config.max_buffer_size)
    }

    pub fn trades_path(&self) -> PathBuf {
        self.output_dir.join(format!("trades_{}.jsonl", self.run_id))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("summary_{}.json", self.run_id))
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    fn open_writer(&mut self) -> PersistenceResult<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let path = self.trades_path();
                info!(path = %path.display(), "Opening trade log (append mode)");
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }

    /// Records buffered but not yet written.
    pub fn pending_records(&self) -> usize {
        self.buffer.len()
    }

    /// Write buffered records to the trades file.
    ///
    /// The buffer is cleared only once the batch is on disk. On failure every
    /// pending record stays buffered and the next flush rewrites the batch.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut batch = String::new();
        for record in &self.buffer {
            batch.push_str(&serde_json::to_string(record)?);
            batch.push('\n');
        }

        let writer = self.open_writer()?;
        let written = writer
            .write_all(batch.as_bytes())
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            // Drop the half-written batch; it is retried from the buffer
            if let Some(writer) = self.writer.take() {
                let _ = writer.into_parts();
            }
            warn!(pending = self.buffer.len(), error = %e, "Trade log write failed");
            return Err(e.into());
        }

        let count = self.buffer.len();
        self.records_written += count;
        self.buffer.clear();
        debug!(records = count, "Flushed trades to JSON Lines");
        Ok(())
    }

    /// Flush pending records and close the trades file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!(
                run_id = %self.run_id,
                records = self.records_written,
                "Closed trade log"
            );
        }
        Ok(())
    }

    fn write_summary(&self, summary: &RunSummary) -> PersistenceResult<()> {
        let path = self.summary_path();
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "Wrote run summary");
        Ok(())
    }
}

impl TradeSink for JsonLinesTradeWriter {
    fn record(&mut self, record: &TradeRecord) -> PersistenceResult<()> {
        if self.finished {
            return Err(PersistenceError::Finished);
        }
        self.buffer.push(record.clone());
        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> PersistenceResult<()> {
        if self.finished {
            return Err(PersistenceError::Finished);
        }
        self.finished = true;
        self.close()?;
        self.write_summary(summary)
    }
}

impl Drop for JsonLinesTradeWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(?e, "Failed to flush trade log on drop");
        }
    }
}
