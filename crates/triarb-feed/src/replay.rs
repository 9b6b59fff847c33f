//! Tick source stage: replays historical ticks with `ReplayMode` pacing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use triarb_core::{PipelineEvent, ReplayMode, Tick};
use triarb_telemetry::Metrics;

use crate::bus::EventQueue;
use crate::error::{FeedError, FeedResult};
use crate::source::TickSource;

/// `[feed]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Historical tick file (`timestamp_ms,instrument,bid,ask`).
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default)]
    pub replay_mode: ReplayMode,
    /// Fixed delay between ticks in fast-forward mode. Zero is allowed.
    #[serde(default = "default_fast_forward_delay_ms")]
    pub fast_forward_delay_ms: u64,
    /// Gap multiplier in slow-motion mode.
    #[serde(default = "default_slow_motion_factor")]
    pub slow_motion_factor: f64,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/ticks.csv")
}

fn default_fast_forward_delay_ms() -> u64 {
    1
}

fn default_slow_motion_factor() -> f64 {
    2.0
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            replay_mode: ReplayMode::default(),
            fast_forward_delay_ms: default_fast_forward_delay_ms(),
            slow_motion_factor: default_slow_motion_factor(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.slow_motion_factor.is_finite() || self.slow_motion_factor < 1.0 {
            return Err(format!(
                "slow_motion_factor ({}) must be finite and >= 1",
                self.slow_motion_factor
            ));
        }
        Ok(())
    }

    pub fn pacing(&self) -> ReplayPacing {
        ReplayPacing {
            mode: self.replay_mode,
            fast_forward_delay: Duration::from_millis(self.fast_forward_delay_ms),
            slow_motion_factor: self.slow_motion_factor,
        }
    }
}

/// Delay policy between consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayPacing {
    pub mode: ReplayMode,
    pub fast_forward_delay: Duration,
    pub slow_motion_factor: f64,
}

impl Default for ReplayPacing {
    fn default() -> Self {
        FeedConfig::default().pacing()
    }
}

impl ReplayPacing {
    /// No delay at all, for tests.
    pub fn immediate() -> Self {
        Self {
            mode: ReplayMode::FastForward,
            fast_forward_delay: Duration::ZERO,
            slow_motion_factor: 1.0,
        }
    }

    /// Delay to apply given the source-data gap from the previous tick.
    ///
    /// Negative gaps (out-of-order data) count as zero.
    pub fn delay(&self, gap: chrono::Duration) -> Duration {
        let gap = gap.to_std().unwrap_or(Duration::ZERO);
        match self.mode {
            ReplayMode::RealTime => gap,
            ReplayMode::FastForward => self.fast_forward_delay,
            ReplayMode::SlowMotion => gap.mul_f64(self.slow_motion_factor),
        }
    }
}

/// Counters reported when the replay ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub published: u64,
    /// True when the run-control token stopped the replay early.
    pub cancelled: bool,
}

/// Leaf stage that publishes ticks from a `TickSource`.
pub struct TickReplayer {
    source: Box<dyn TickSource>,
    pacing: ReplayPacing,
}

impl TickReplayer {
    pub fn new(source: Box<dyn TickSource>, pacing: ReplayPacing) -> Self {
        Self { source, pacing }
    }

    /// Publish every tick to `outbox`, pacing by the source timestamps.
    ///
    /// The outbox is closed on every exit path so downstream stages can drain.
    pub async fn run(
        mut self,
        outbox: EventQueue<PipelineEvent>,
        shutdown: CancellationToken,
    ) -> FeedResult<ReplayStats> {
        info!(
            source = %self.source.describe(),
            mode = %self.pacing.mode,
            "Tick replay starting"
        );
        let result = self.replay(&outbox, &shutdown).await;
        outbox.close();

        match &result {
            Ok(stats) => info!(
                published = stats.published,
                cancelled = stats.cancelled,
                "Tick replay finished"
            ),
            Err(e) => warn!(error = %e, "Tick replay aborted"),
        }
        result
    }

    async fn replay(
        &mut self,
        outbox: &EventQueue<PipelineEvent>,
        shutdown: &CancellationToken,
    ) -> FeedResult<ReplayStats> {
        self.source.rewind()?;

        let mut stats = ReplayStats::default();
        let mut previous: Option<Tick> = None;

        while let Some(tick) = self.source.next_tick()? {
            if shutdown.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            if let Some(prev) = &previous {
                let delay = self.pacing.delay(tick.timestamp() - prev.timestamp());
                if !delay.is_zero() {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            stats.cancelled = true;
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }

            debug!(
                instrument = %tick.instrument(),
                bid = tick.bid(),
                ask = tick.ask(),
                "Tick"
            );
            Metrics::tick_ingested(tick.instrument().as_str());
            outbox.publish(tick.clone());
            stats.published += 1;
            previous = Some(tick);
        }

        Ok(stats)
    }
}

/// Build a replayer from configuration, opening the CSV tick file.
pub fn replayer_from_config(config: &FeedConfig) -> FeedResult<TickReplayer> {
    config.validate().map_err(FeedError::ConfigError)?;
    let source = crate::csv::CsvTickSource::open(&config.data_file)?;
    Ok(TickReplayer::new(Box::new(source), config.pacing()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Poll;
    use crate::source::VecTickSource;
    use chrono::{DateTime, Utc};

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    fn pacing(mode: ReplayMode) -> ReplayPacing {
        ReplayPacing {
            mode,
            fast_forward_delay: Duration::from_millis(1),
            slow_motion_factor: 2.0,
        }
    }

    #[test]
    fn test_pacing_delays() {
        let gap = chrono::Duration::milliseconds(250);
        assert_eq!(pacing(ReplayMode::RealTime).delay(gap), Duration::from_millis(250));
        assert_eq!(pacing(ReplayMode::FastForward).delay(gap), Duration::from_millis(1));
        assert_eq!(pacing(ReplayMode::SlowMotion).delay(gap), Duration::from_millis(500));
    }

    #[test]
    fn test_negative_gap_clamped() {
        let gap = chrono::Duration::milliseconds(-40);
        assert_eq!(pacing(ReplayMode::RealTime).delay(gap), Duration::ZERO);
        assert_eq!(pacing(ReplayMode::SlowMotion).delay(gap), Duration::ZERO);
    }

    #[test]
    fn test_feed_config_validate() {
        assert!(FeedConfig::default().validate().is_ok());
        let config = FeedConfig {
            slow_motion_factor: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_replay_publishes_all_and_closes() {
        let source = VecTickSource::new(vec![
            Tick::new("EUR/USD", 1.1000, 1.1002, ts(0)),
            Tick::new("GBP/USD", 1.3000, 1.3002, ts(5)),
            Tick::new("EUR/GBP", 0.8500, 0.8502, ts(10)),
        ]);
        let outbox = EventQueue::new("ticks");
        let replayer = TickReplayer::new(Box::new(source), ReplayPacing::immediate());

        let stats = replayer
            .run(outbox.clone(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stats.published, 3);
        assert!(!stats.cancelled);
        assert!(outbox.is_closed());

        let mut instruments = Vec::new();
        while let Poll::Ready(PipelineEvent::Tick(tick)) = outbox.poll() {
            instruments.push(tick.instrument().to_string());
        }
        assert_eq!(instruments, vec!["EUR/USD", "GBP/USD", "EUR/GBP"]);
        assert_eq!(outbox.poll(), Poll::Drained);
    }

    #[tokio::test]
    async fn test_replay_stops_on_cancel() {
        let source = VecTickSource::new(vec![
            Tick::new("EUR/USD", 1.1000, 1.1002, ts(0)),
            Tick::new("EUR/USD", 1.1000, 1.1002, ts(60_000)),
        ]);
        let outbox = EventQueue::new("ticks");
        let shutdown = CancellationToken::new();
        let replayer = TickReplayer::new(Box::new(source), pacing(ReplayMode::RealTime));

        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let stats = replayer.run(outbox.clone(), shutdown).await.unwrap();
        assert_eq!(stats.published, 1);
        assert!(stats.cancelled);
        assert!(outbox.is_closed());
    }
}
