//! Queue-driven stage loops for the spread estimator and signal decider.
//!
//! Each stage polls its inbox until the inbox is drained or the run-control
//! token is cancelled, processes every event to completion, and closes its
//! outbox on exit so the next stage can drain.
//!
//! # Panics
//!
//! A stage panics when it receives an event variant it does not handle.
//! That can only happen if the queues were wired to the wrong stages.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use triarb_core::PipelineEvent;
use triarb_feed::EventQueue;

use crate::decision::{Decision, SignalDecider};
use crate::spread::SpreadEstimator;

/// Counters reported by the spread stage on exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpreadStats {
    pub ticks: u64,
    pub events: u64,
}

/// Ticks in, spread events out.
pub struct SpreadStage {
    estimator: SpreadEstimator,
}

impl SpreadStage {
    pub fn new(estimator: SpreadEstimator) -> Self {
        Self { estimator }
    }

    pub async fn run(
        mut self,
        inbox: EventQueue<PipelineEvent>,
        outbox: EventQueue<PipelineEvent>,
        shutdown: CancellationToken,
    ) -> SpreadStats {
        info!(
            target_pair = %self.estimator.config().target,
            window = self.estimator.config().window_size,
            "Spread stage started"
        );
        let mut stats = SpreadStats::default();

        while let Some(event) = inbox.next(&shutdown).await {
            let tick = match event {
                PipelineEvent::Tick(tick) => tick,
                other => panic!(
                    "pipeline wiring bug: spread stage received a {} event",
                    other.kind()
                ),
            };
            stats.ticks += 1;
            if let Some(spread) = self.estimator.on_tick(&tick) {
                stats.events += 1;
                outbox.publish(spread);
            }
        }

        outbox.close();
        info!(
            ticks = stats.ticks,
            events = stats.events,
            samples = self.estimator.samples(),
            volatility = self.estimator.volatility(),
            "Spread stage stopped"
        );
        stats
    }
}

/// Counters reported by the decision stage on exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionStats {
    pub events: u64,
    pub signals: u64,
    pub flat: u64,
    /// True if the stage stopped because trading halted.
    pub halted: bool,
}

/// Spread events in, trade signals out.
pub struct DecisionStage {
    decider: SignalDecider,
}

impl DecisionStage {
    pub fn new(decider: SignalDecider) -> Self {
        Self { decider }
    }

    pub async fn run(
        mut self,
        inbox: EventQueue<PipelineEvent>,
        outbox: EventQueue<PipelineEvent>,
        shutdown: CancellationToken,
    ) -> DecisionStats {
        info!("Decision stage started");
        let mut stats = DecisionStats::default();

        while let Some(event) = inbox.next(&shutdown).await {
            let spread = match event {
                PipelineEvent::Spread(spread) => spread,
                other => panic!(
                    "pipeline wiring bug: decision stage received a {} event",
                    other.kind()
                ),
            };
            stats.events += 1;
            match self.decider.decide(&spread) {
                Decision::Signal(signal) => {
                    stats.signals += 1;
                    outbox.publish(signal);
                }
                Decision::Flat => stats.flat += 1,
                Decision::Halted => {
                    stats.halted = true;
                    warn!("Trading halted, decision stage refusing further events");
                    break;
                }
            }
        }

        outbox.close();
        info!(
            events = stats.events,
            signals = stats.signals,
            flat = stats.flat,
            halted = stats.halted,
            "Decision stage stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecisionConfig, SpreadConfig};
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use triarb_core::{SpreadEvent, Tick};
    use triarb_feed::Poll;
    use triarb_risk::{AccountConfig, AccountState, HaltReason};

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    fn spread_event(spread: f64) -> SpreadEvent {
        SpreadEvent {
            spread,
            threshold: 0.001,
            volatility: 0.0,
            timestamp: ts(0),
        }
    }

    fn spread_stage(baseline: f64) -> SpreadStage {
        SpreadStage::new(
            SpreadEstimator::new(SpreadConfig {
                baseline_threshold: baseline,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_spread_stage_drains_and_closes() {
        let inbox = EventQueue::new("ticks");
        let outbox = EventQueue::new("spreads");
        inbox.publish(Tick::new("EUR/USD", 1.1000, 1.1002, ts(0)));
        inbox.publish(Tick::new("GBP/USD", 1.2000, 1.2002, ts(1)));
        inbox.publish(Tick::new("EUR/GBP", 0.8500, 0.8502, ts(2)));
        inbox.close();

        let stats = spread_stage(0.01)
            .run(inbox, outbox.clone(), CancellationToken::new())
            .await;

        assert_eq!(stats, SpreadStats { ticks: 3, events: 1 });
        assert!(matches!(outbox.poll(), Poll::Ready(PipelineEvent::Spread(_))));
        assert_eq!(outbox.poll(), Poll::Drained);
    }

    #[tokio::test]
    async fn test_spread_stage_stops_on_cancel() {
        let inbox: EventQueue = EventQueue::new("ticks");
        let outbox = EventQueue::new("spreads");
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let stats = spread_stage(0.01).run(inbox, outbox.clone(), shutdown).await;
        assert_eq!(stats.ticks, 0);
        assert!(outbox.is_closed());
    }

    #[tokio::test]
    #[should_panic(expected = "pipeline wiring bug")]
    async fn test_spread_stage_panics_on_wrong_variant() {
        let inbox = EventQueue::new("ticks");
        inbox.publish(spread_event(0.01));
        inbox.close();
        spread_stage(0.01)
            .run(inbox, EventQueue::new("spreads"), CancellationToken::new())
            .await;
    }

    #[tokio::test]
    async fn test_decision_stage_emits_signals() {
        let account = Arc::new(AccountState::new(&AccountConfig::default()).unwrap());
        let stage = DecisionStage::new(SignalDecider::new(&DecisionConfig::default(), account));
        let inbox = EventQueue::new("spreads");
        let outbox = EventQueue::new("signals");
        inbox.publish(spread_event(0.002));
        inbox.publish(spread_event(0.0));
        inbox.publish(spread_event(-0.003));
        inbox.close();

        let stats = stage.run(inbox, outbox.clone(), CancellationToken::new()).await;
        assert_eq!(stats.events, 3);
        assert_eq!(stats.signals, 2);
        assert_eq!(stats.flat, 1);
        assert!(!stats.halted);
        assert_eq!(outbox.len(), 2);
        assert!(outbox.is_closed());
    }

    #[tokio::test]
    async fn test_decision_stage_stops_when_halted() {
        let account = Arc::new(AccountState::new(&AccountConfig::default()).unwrap());
        account.force_halt(HaltReason::Manual {
            message: "test".to_string(),
        });
        let stage = DecisionStage::new(SignalDecider::new(&DecisionConfig::default(), account));
        let inbox = EventQueue::new("spreads");
        let outbox = EventQueue::new("signals");
        inbox.publish(spread_event(0.002));
        inbox.publish(spread_event(0.004));

        // Inbox left open: the stage must stop on its own
        let stats = stage.run(inbox.clone(), outbox.clone(), CancellationToken::new()).await;
        assert!(stats.halted);
        assert_eq!(stats.signals, 0);
        assert!(outbox.is_empty());
        assert!(outbox.is_closed());
        assert_eq!(inbox.len(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "pipeline wiring bug")]
    async fn test_decision_stage_panics_on_wrong_variant() {
        let account = Arc::new(AccountState::new(&AccountConfig::default()).unwrap());
        let stage = DecisionStage::new(SignalDecider::new(&DecisionConfig::default(), account));
        let inbox = EventQueue::new("spreads");
        inbox.publish(Tick::new("EUR/USD", 1.1, 1.1002, ts(0)));
        inbox.close();
        stage
            .run(inbox, EventQueue::new("signals"), CancellationToken::new())
            .await;
    }
}
