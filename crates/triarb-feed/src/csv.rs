//! Historical tick file reader.
//!
//! File format: one header line, then `timestamp_ms,instrument,bid,ask`
//! per line. Lines that fail to parse, or carry an unusable quote, are
//! skipped with a warning and counted; they never reach the pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tracing::{debug, warn};
use triarb_core::Tick;
use triarb_telemetry::Metrics;

use crate::error::{FeedError, FeedResult};
use crate::source::TickSource;

/// Tick source backed by a CSV file on disk.
#[derive(Debug)]
pub struct CsvTickSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    malformed: u64,
}

impl CsvTickSource {
    /// Open the file and skip its header line.
    ///
    /// Fails with `FeedError::SourceUnavailable` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> FeedResult<Self> {
        let path = path.as_ref().to_path_buf();
        let lines = Self::open_lines(&path)?;
        debug!(path = %path.display(), "Opened tick file");
        Ok(Self {
            path,
            lines,
            line_no: 1,
            malformed: 0,
        })
    }

    fn open_lines(path: &Path) -> FeedResult<Lines<BufReader<File>>> {
        let file = File::open(path).map_err(|source| FeedError::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })?;
        let mut lines = BufReader::new(file).lines();
        // Header
        if let Some(header) = lines.next() {
            header?;
        }
        Ok(lines)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines skipped as malformed since the last open or rewind.
    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }
}

/// Parse one data line into a validated tick.
fn parse_line(line: &str) -> FeedResult<Tick> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(FeedError::ParseError(format!(
            "expected 4 fields, got {}",
            fields.len()
        )));
    }

    let millis: i64 = fields[0]
        .parse()
        .map_err(|e| FeedError::ParseError(format!("timestamp {:?}: {e}", fields[0])))?;
    let timestamp = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FeedError::ParseError(format!("timestamp out of range: {millis}")))?;

    let instrument = fields[1];
    if instrument.is_empty() {
        return Err(FeedError::ParseError("empty instrument".to_string()));
    }

    let bid: f64 = fields[2]
        .parse()
        .map_err(|e| FeedError::ParseError(format!("bid {:?}: {e}", fields[2])))?;
    let ask: f64 = fields[3]
        .parse()
        .map_err(|e| FeedError::ParseError(format!("ask {:?}: {e}", fields[3])))?;

    Tick::checked(instrument, bid, ask, timestamp).map_err(|e| FeedError::ParseError(e.to_string()))
}

impl TickSource for CsvTickSource {
    fn next_tick(&mut self) -> FeedResult<Option<Tick>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Ok(tick) => return Ok(Some(tick)),
                Err(e) => {
                    self.malformed += 1;
                    Metrics::tick_malformed();
                    warn!(
                        path = %self.path.display(),
                        line = self.line_no,
                        error = %e,
                        "Skipping malformed tick record"
                    );
                }
            }
        }
    }

    fn rewind(&mut self) -> FeedResult<()> {
        self.lines = Self::open_lines(&self.path)?;
        self.line_no = 1;
        self.malformed = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}
