//! Periodic risk monitor.
//!
//! Polls `AccountState` on a fixed interval. Once trading is halted it cancels
//! the run-control token so every stage stops within one polling interval.
//!
//! Fills latch the halt themselves under the ledger lock, so in a normal run
//! the monitor only observes. Its own `force_halt` covers a breach the ledger
//! has not latched.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use triarb_telemetry::Metrics;

use crate::account::AccountState;
use crate::halt::HaltReason;

/// `[risk]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for RiskMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl RiskMonitorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be positive".to_string());
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Cross-cutting observer of the shared account.
pub struct RiskMonitor {
    account: Arc<AccountState>,
    config: RiskMonitorConfig,
}

impl RiskMonitor {
    #[must_use]
    pub fn new(account: Arc<AccountState>, config: RiskMonitorConfig) -> Self {
        Self { account, config }
    }

    /// One inspection. Returns `true` if trading is halted afterwards.
    pub fn check_once(&self) -> bool {
        if let Some(breach) = self.account.check_boundary() {
            let event = breach.to_string();
            if self.account.force_halt(HaltReason::RiskMonitor { event }) {
                Metrics::halt(breach.label());
            }
        }
        !self.account.is_active()
    }

    /// Poll until `stop` is cancelled.
    ///
    /// Once trading is halted, `run_control` is cancelled. The monitor keeps
    /// running until the orchestrator stops it.
    pub async fn run(self, run_control: CancellationToken, stop: CancellationToken) {
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "Risk monitor started"
        );
        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut halt_reported = false;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => {}
            }

            let halted = self.check_once();
            let snapshot = self.account.snapshot();
            Metrics::capital(snapshot.capital);
            debug!(
                capital = snapshot.capital,
                drawdown = snapshot.peak_capital - snapshot.capital,
                active = snapshot.active,
                "Risk check"
            );

            if halted && !halt_reported {
                halt_reported = true;
                let reason = self
                    .account
                    .halt_reason()
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                let halted_at = self
                    .account
                    .halted_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                warn!(
                    reason = %reason,
                    halted_at = %halted_at,
                    "Risk monitor observed trading halt"
                );
                if !run_control.is_cancelled() {
                    info!("Cancelling run after trading halt");
                    run_control.cancel();
                }
            }
        }

        info!("Risk monitor stopped");
    }
}
