//! Pipeline orchestration.
//!
//! Every component is built and validated before any task is spawned. The
//! stages run as independent tokio tasks linked by event queues:
//!
//! ```text
//! replayer -> [ticks] -> spread -> [spreads] -> decision -> [signals] -> execution
//!                        risk monitor (polls the shared account)
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use triarb_core::{PipelineEvent, RunSummary};
use triarb_detector::{
    DecisionStage, DecisionStats, SignalDecider, SpreadEstimator, SpreadStage, SpreadStats,
};
use triarb_executor::{ExecutionSimulator, ExecutionStage, RandomSource, SeededRandom};
use triarb_feed::{CsvTickSource, EventQueue, ReplayStats, TickReplayer, TickSource};
use triarb_persistence::{JsonLinesTradeWriter, TradeSink};
use triarb_risk::{AccountState, RiskMonitor};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Counters and summary for a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub replay: ReplayStats,
    pub spread: SpreadStats,
    pub decision: DecisionStats,
    pub summary: RunSummary,
}

/// A fully wired, not yet started pipeline.
pub struct Pipeline {
    account: Arc<AccountState>,
    replayer: TickReplayer,
    spread: SpreadStage,
    decision: DecisionStage,
    execution: ExecutionStage,
    monitor: RiskMonitor,
    shutdown: CancellationToken,
}

impl Pipeline {
    /// Wire the pipeline from explicit components.
    pub fn new(
        config: AppConfig,
        source: Box<dyn TickSource>,
        sink: Box<dyn TradeSink>,
        rng: Box<dyn RandomSource>,
    ) -> AppResult<Self> {
        config.validate()?;

        let account = Arc::new(AccountState::new(&config.account)?);
        let estimator = SpreadEstimator::new(config.spread.clone())?;
        let decider = SignalDecider::new(&config.decision, Arc::clone(&account));
        let simulator = ExecutionSimulator::new(config.execution.clone(), Arc::clone(&account), rng)?;

        Ok(Self {
            replayer: TickReplayer::new(source, config.feed.pacing()),
            spread: SpreadStage::new(estimator),
            decision: DecisionStage::new(decider),
            execution: ExecutionStage::new(simulator, sink),
            monitor: RiskMonitor::new(Arc::clone(&account), config.risk.clone()),
            account,
            shutdown: CancellationToken::new(),
        })
    }

    /// Wire the pipeline from configuration: CSV ticks in, JSON Lines out.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let source = CsvTickSource::open(&config.feed.data_file)?;
        let writer = JsonLinesTradeWriter::from_config(&config.persistence)?;
        info!(
            data_file = %config.feed.data_file.display(),
            trades_path = %writer.trades_path().display(),
            summary_path = %writer.summary_path().display(),
            seeded = config.execution.seed.is_some(),
            "Pipeline configured"
        );
        let rng = SeededRandom::new(config.execution.seed);
        Self::new(config, Box::new(source), Box::new(writer), Box::new(rng))
    }

    /// Token that ends the run early when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn account(&self) -> Arc<AccountState> {
        Arc::clone(&self.account)
    }

    /// Run every stage to completion.
    ///
    /// A panic inside a stage is propagated to the caller unchanged.
    pub async fn run(self) -> AppResult<RunReport> {
        let ticks = EventQueue::<PipelineEvent>::new("ticks");
        let spreads = EventQueue::<PipelineEvent>::new("spreads");
        let signals = EventQueue::<PipelineEvent>::new("signals");
        let monitor_stop = CancellationToken::new();

        info!("Starting pipeline");

        let monitor = tokio::spawn(
            self.monitor
                .run(self.shutdown.clone(), monitor_stop.clone()),
        );
        let execution = tokio::spawn(self.execution.run(signals.clone(), self.shutdown.clone()));
        let decision = tokio::spawn(self.decision.run(
            spreads.clone(),
            signals,
            self.shutdown.clone(),
        ));
        let spread = tokio::spawn(self.spread.run(ticks.clone(), spreads, self.shutdown.clone()));
        let replayer = tokio::spawn(self.replayer.run(ticks, self.shutdown.clone()));

        // Joined in pipeline order; each stage closes its outbox on exit
        let replay = join("replayer", replayer).await;
        let spread = join("spread", spread).await;
        let decision = join("decision", decision).await;
        let execution = join("execution", execution).await;

        monitor_stop.cancel();
        join("risk monitor", monitor).await?;

        let replay = replay??;
        let spread = spread?;
        let decision = decision?;
        let summary = execution??;

        if self.shutdown.is_cancelled() && !summary.halted {
            warn!("Pipeline stopped before the tick file was exhausted");
        }
        info!(
            ticks = replay.published,
            spread_events = spread.events,
            signals = decision.signals,
            trades = summary.total_trades,
            total_pnl = %format!("{:.2}", summary.total_pnl),
            halted = summary.halted,
            "Pipeline finished"
        );

        Ok(RunReport {
            replay,
            spread,
            decision,
            summary,
        })
    }
}

async fn join<T>(stage: &'static str, handle: JoinHandle<T>) -> AppResult<T> {
    match handle.await {
        Ok(value) => Ok(value),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(AppError::Join(format!("{stage}: {e}"))),
    }
}
