//! Execution stage loop.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use triarb_core::{PipelineEvent, RunSummary};
use triarb_feed::EventQueue;
use triarb_persistence::TradeSink;

use crate::error::ExecutorResult;
use crate::simulator::{ExecutionOutcome, ExecutionSimulator};

/// Signals in, trade records out to the sink.
///
/// Records reach the sink once each, in execution order. The run summary is
/// handed to the sink exactly once when the loop ends. A sink failure cancels
/// the run; the summary is still delivered before the error is returned.
pub struct ExecutionStage {
    simulator: ExecutionSimulator,
    sink: Box<dyn TradeSink>,
}

impl ExecutionStage {
    pub fn new(simulator: ExecutionSimulator, sink: Box<dyn TradeSink>) -> Self {
        Self { simulator, sink }
    }

    pub async fn run(
        mut self,
        inbox: EventQueue<PipelineEvent>,
        shutdown: CancellationToken,
    ) -> ExecutorResult<RunSummary> {
        info!(
            latency_ms = self.simulator.latency().as_millis() as u64,
            "Execution stage started"
        );

        let mut sink_failure = None;
        while let Some(event) = inbox.next(&shutdown).await {
            let signal = match event {
                PipelineEvent::Signal(signal) => signal,
                other => panic!(
                    "pipeline wiring bug: execution stage received a {} event",
                    other.kind()
                ),
            };

            if self.simulator.accepts_work() {
                let latency = self.simulator.latency();
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
            }

            if let ExecutionOutcome::Filled(record) = self.simulator.execute(&signal) {
                if let Err(e) = self.sink.record(&record) {
                    error!(seq = record.seq, error = %e, "Trade sink failed, cancelling run");
                    shutdown.cancel();
                    sink_failure = Some(e);
                    break;
                }
            }
        }

        let summary = self.simulator.summary();
        info!(
            trades = summary.total_trades,
            wins = summary.wins,
            losses = summary.losses,
            win_rate = %format!("{:.2}%", summary.win_rate * 100.0),
            total_pnl = %format!("{:.2}", summary.total_pnl),
            avg_profit = %format!("{:.2}", summary.average_profit()),
            final_capital = %format!("{:.2}", summary.final_capital),
            max_drawdown = %format!("{:.2}", summary.max_drawdown),
            rejected_fills = summary.rejected_fills,
            skipped_signals = summary.skipped_signals,
            halted = summary.halted,
            "Execution stage stopped"
        );
        let finished = self.sink.finish(&summary);
        if let Some(e) = sink_failure {
            if let Err(finish_err) = finished {
                warn!(error = %finish_err, "Trade sink also failed to finish");
            }
            return Err(e.into());
        }
        finished?;
        Ok(summary)
    }
}
