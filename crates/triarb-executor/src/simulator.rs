//! Execution simulator state machine.
//!
//! States: `Active` → `Halted`. Halted is terminal for the run.
//!
//! Profit convention: the captured edge of a signal is
//! `-direction.sign() × spread`, which is `|spread|` for a correctly oriented
//! signal (sell when the quoted cross is rich, buy when it is cheap). Slippage
//! is adverse when positive and reduces that edge:
//!
//! `profit = (edge - slippage) × notional`

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use triarb_core::{RunSummary, TradeRecord, TradeSignal};
use triarb_risk::AccountState;
use triarb_telemetry::Metrics;

use crate::config::ExecutionConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::random::RandomSource;

/// Simulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Active,
    /// Terminal: every later signal is skipped.
    Halted,
}

/// Result of one signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Filled(TradeRecord),
    /// Fill-probability draw missed. No account change, no record.
    NoFill { draw: f64 },
    /// Signal discarded because trading is halted.
    Skipped,
}

/// Converts trade signals into simulated fills.
pub struct ExecutionSimulator {
    config: ExecutionConfig,
    account: Arc<AccountState>,
    rng: Box<dyn RandomSource>,
    state: ExecutionState,
    next_seq: u64,
    wins: u64,
    losses: u64,
    rejected_fills: u64,
    skipped_signals: u64,
}

impl ExecutionSimulator {
    pub fn new(
        config: ExecutionConfig,
        account: Arc<AccountState>,
        rng: Box<dyn RandomSource>,
    ) -> ExecutorResult<Self> {
        config.validate().map_err(ExecutorError::ConfigError)?;
        let state = if account.is_active() {
            ExecutionState::Active
        } else {
            ExecutionState::Halted
        };
        Ok(Self {
            config,
            account,
            rng,
            state,
            next_seq: 1,
            wins: 0,
            losses: 0,
            rejected_fills: 0,
            skipped_signals: 0,
        })
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// True while new signals can still be processed.
    ///
    /// Also picks up a halt forced from outside (risk monitor).
    pub fn accepts_work(&mut self) -> bool {
        if self.state == ExecutionState::Active && !self.account.is_active() {
            self.enter_halted();
        }
        self.state == ExecutionState::Active
    }

    pub fn latency(&self) -> Duration {
        self.config.latency()
    }

    fn enter_halted(&mut self) {
        self.state = ExecutionState::Halted;
        let reason = self
            .account
            .halt_reason()
            .map(|r| r.to_string())
            .unwrap_or_default();
        warn!(reason = %reason, "Execution simulator halted");
    }

    fn skip(&mut self) -> ExecutionOutcome {
        self.skipped_signals += 1;
        Metrics::rejected("halted");
        ExecutionOutcome::Skipped
    }

    /// Process one signal. Latency is applied by the caller.
    pub fn execute(&mut self, signal: &TradeSignal) -> ExecutionOutcome {
        if !self.accepts_work() {
            return self.skip();
        }

        let draw = self.rng.uniform();
        if draw > self.config.fill_probability {
            self.rejected_fills += 1;
            Metrics::rejected("no_fill");
            debug!(draw, fill_probability = self.config.fill_probability, "Order not filled");
            return ExecutionOutcome::NoFill { draw };
        }

        let slippage = self
            .rng
            .normal(self.config.slippage_mean, self.config.slippage_std_dev);
        let edge = -signal.direction().sign() * signal.spread();
        let effective_edge = edge - slippage;
        let notional = self
            .config
            .sizing
            .notional(self.account.capital(), self.account.risk_fraction());
        let profit = effective_edge * notional;

        let Some(snapshot) = self.account.apply_pnl(profit) else {
            // Halt forced between the state check and the fill
            self.enter_halted();
            return self.skip();
        };

        let win = profit > 0.0;
        if win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        let record = TradeRecord {
            seq: self.next_seq,
            timestamp: signal.timestamp(),
            direction: signal.direction(),
            spread: signal.spread(),
            strength: signal.strength(),
            slippage,
            effective_edge,
            notional,
            profit,
            win,
            capital_after: snapshot.capital,
        };
        self.next_seq += 1;
        Metrics::fill(profit, snapshot.capital);
        debug!(
            seq = record.seq,
            direction = %record.direction,
            profit = %profit,
            capital = %snapshot.capital,
            "Simulated fill"
        );

        if !snapshot.active {
            if let Some(reason) = self.account.halt_reason() {
                Metrics::halt(reason.label());
            }
            self.enter_halted();
        }

        ExecutionOutcome::Filled(record)
    }

    /// End-of-run summary from the account and local counters.
    pub fn summary(&self) -> RunSummary {
        let snapshot = self.account.snapshot();
        let total_trades = self.wins + self.losses;
        let win_rate = if total_trades == 0 {
            0.0
        } else {
            self.wins as f64 / total_trades as f64
        };
        RunSummary {
            total_trades,
            wins: self.wins,
            losses: self.losses,
            win_rate,
            total_pnl: snapshot.cumulative_pnl,
            initial_capital: self.account.initial_capital(),
            final_capital: snapshot.capital,
            peak_capital: snapshot.peak_capital,
            max_drawdown: snapshot.max_drawdown,
            rejected_fills: self.rejected_fills,
            skipped_signals: self.skipped_signals,
            halted: !snapshot.active,
            halt_reason: self.account.halt_reason().map(|r| r.to_string()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedRandom;
    use super::*;
    use crate::config::LotSizing;
    use chrono::DateTime;
    use triarb_core::Direction;
    use triarb_risk::{AccountConfig, BoundaryRule, HaltReason};

    fn account(boundary: BoundaryRule) -> Arc<AccountState> {
        Arc::new(
            AccountState::new(&AccountConfig {
                initial_capital: 1000.0,
                risk_fraction: 0.01,
                boundary,
            })
            .unwrap(),
        )
    }

    fn config() -> ExecutionConfig {
        ExecutionConfig {
            latency_ms: 0,
            fill_probability: 0.9,
            slippage_mean: 0.0,
            slippage_std_dev: 0.0,
            sizing: LotSizing::Fixed {
                notional: 100_000.0,
            },
            seed: None,
        }
    }

    fn signal(direction: Direction, spread: f64) -> TradeSignal {
        TradeSignal::new(
            direction,
            spread,
            spread.abs(),
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        )
    }

    fn simulator(
        account: Arc<AccountState>,
        uniforms: &[f64],
        normals: &[f64],
    ) -> ExecutionSimulator {
        ExecutionSimulator::new(
            config(),
            account,
            Box::new(ScriptedRandom::new(uniforms, normals)),
        )
        .unwrap()
    }

    #[test]
    fn test_fill_profit_convention() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = simulator(Arc::clone(&account), &[0.5, 0.5], &[0.0001, 0.0]);

        // Sell a rich cross: edge 0.002, slippage 0.0001 → 0.0019 × 100k
        let ExecutionOutcome::Filled(record) = sim.execute(&signal(Direction::Sell, 0.002)) else {
            panic!("expected fill");
        };
        assert_eq!(record.seq, 1);
        assert!((record.effective_edge - 0.0019).abs() < 1e-12);
        assert!((record.profit - 190.0).abs() < 1e-6);
        assert!(record.win);
        assert!((account.capital() - 1190.0).abs() < 1e-6);

        // Buy a cheap cross: edge |−0.001|
        let ExecutionOutcome::Filled(record) = sim.execute(&signal(Direction::Buy, -0.001)) else {
            panic!("expected fill");
        };
        assert_eq!(record.seq, 2);
        assert!((record.profit - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejected_fill_has_no_side_effects() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = simulator(Arc::clone(&account), &[0.95], &[]);
        let before = account.snapshot();

        let outcome = sim.execute(&signal(Direction::Sell, 0.002));
        assert_eq!(outcome, ExecutionOutcome::NoFill { draw: 0.95 });
        assert_eq!(account.snapshot(), before);

        let summary = sim.summary();
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.rejected_fills, 1);
        assert_eq!(sim.state(), ExecutionState::Active);
    }

    #[test]
    fn test_draw_equal_to_probability_fills() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = simulator(account, &[0.9], &[0.0]);
        assert!(matches!(
            sim.execute(&signal(Direction::Sell, 0.001)),
            ExecutionOutcome::Filled(_)
        ));
    }

    #[test]
    fn test_halt_is_terminal() {
        let account = account(BoundaryRule::CapitalFloor { min_capital: 900.0 });
        // Adverse slippage 0.003 on edge 0.001 → −200
        let mut sim = simulator(Arc::clone(&account), &[0.1, 0.1, 0.1], &[0.003, 0.0, 0.0]);

        let ExecutionOutcome::Filled(record) = sim.execute(&signal(Direction::Sell, 0.001)) else {
            panic!("expected fill");
        };
        assert!(!record.win);
        assert_eq!(sim.state(), ExecutionState::Halted);
        assert!(!account.is_active());

        for _ in 0..5 {
            assert_eq!(
                sim.execute(&signal(Direction::Sell, 0.01)),
                ExecutionOutcome::Skipped
            );
        }
        let summary = sim.summary();
        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.skipped_signals, 5);
        assert!(summary.halted);
        assert!(summary.halt_reason.unwrap().contains("Boundary breached"));
        assert!((account.capital() - 800.0).abs() < 1e-6);
    }

    #[test]
    fn test_external_halt_observed() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = simulator(Arc::clone(&account), &[0.1], &[0.0]);
        assert!(sim.accepts_work());

        account.force_halt(HaltReason::RiskMonitor {
            event: "test".to_string(),
        });
        assert!(!sim.accepts_work());
        assert_eq!(
            sim.execute(&signal(Direction::Sell, 0.002)),
            ExecutionOutcome::Skipped
        );
        assert_eq!(account.snapshot().fills, 0);
    }

    #[test]
    fn test_risk_fraction_sizing_uses_capital() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = ExecutionSimulator::new(
            ExecutionConfig {
                sizing: LotSizing::RiskFraction { pip_value: 0.0001 },
                ..config()
            },
            Arc::clone(&account),
            Box::new(ScriptedRandom::new(&[0.1], &[0.0])),
        )
        .unwrap();

        // 1000 × 1% / 0.0001 = 100_000
        let ExecutionOutcome::Filled(record) = sim.execute(&signal(Direction::Buy, -0.001)) else {
            panic!("expected fill");
        };
        assert!((record.notional - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ExecutionSimulator::new(
            ExecutionConfig {
                fill_probability: -0.1,
                ..config()
            },
            account(BoundaryRule::Bankruptcy),
            Box::new(ScriptedRandom::new(&[], &[])),
        );
        assert!(matches!(result, Err(ExecutorError::ConfigError(_))));
    }

    #[test]
    fn test_summary_win_rate() {
        let account = account(BoundaryRule::Bankruptcy);
        let mut sim = simulator(account, &[0.1, 0.1, 0.1, 0.1], &[0.0, 0.0, 0.002, 0.0]);
        sim.execute(&signal(Direction::Sell, 0.001));
        sim.execute(&signal(Direction::Sell, 0.001));
        sim.execute(&signal(Direction::Sell, 0.001)); // slippage above edge → loss
        sim.execute(&signal(Direction::Sell, 0.001));

        let summary = sim.summary();
        assert_eq!(summary.total_trades, 4);
        assert_eq!(summary.wins, 3);
        assert_eq!(summary.losses, 1);
        assert!((summary.win_rate - 0.75).abs() < 1e-12);
        assert!((summary.total_pnl - 200.0).abs() < 1e-6);
    }
}
