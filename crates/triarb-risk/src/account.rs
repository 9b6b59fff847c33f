//! Shared account state.
//!
//! `AccountState` is the only object mutated by more than one stage. The
//! executor applies PnL, the decision stage and risk monitor read it, and the
//! risk monitor may force the halt. Every mutation happens under one ledger
//! lock and is a single accumulation plus an optional halt transition, so a
//! fill can never land after the halt.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RiskError, RiskResult};
use crate::halt::{HaltLatch, HaltReason};

// ============================================================================
// Configuration
// ============================================================================

/// Capital level at which trading halts.
///
/// `capital <= 0` always halts, whatever the rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BoundaryRule {
    /// Halt only on bankruptcy.
    Bankruptcy,
    /// Halt when capital falls to or below a fixed floor.
    CapitalFloor { min_capital: f64 },
    /// Halt when capital falls to or below `peak × (1 − fraction)`.
    MaxDrawdown { fraction: f64 },
}

impl Default for BoundaryRule {
    fn default() -> Self {
        Self::MaxDrawdown { fraction: 0.1 }
    }
}

impl BoundaryRule {
    /// Capital level that trips the rule for the given peak.
    pub fn limit(&self, peak: f64) -> f64 {
        match *self {
            Self::Bankruptcy => 0.0,
            Self::CapitalFloor { min_capital } => min_capital.max(0.0),
            Self::MaxDrawdown { fraction } => (peak * (1.0 - fraction)).max(0.0),
        }
    }

    /// Halt reason if `capital` breaches the rule.
    pub fn breach(&self, capital: f64, peak: f64) -> Option<HaltReason> {
        if capital <= 0.0 {
            return Some(HaltReason::Bankrupt { capital });
        }
        let limit = self.limit(peak);
        if capital <= limit {
            Some(HaltReason::BoundaryBreached { capital, limit })
        } else {
            None
        }
    }

    fn validate(&self, initial_capital: f64) -> Result<(), String> {
        match *self {
            Self::Bankruptcy => Ok(()),
            Self::CapitalFloor { min_capital } => {
                if !min_capital.is_finite() || min_capital < 0.0 {
                    return Err(format!("min_capital ({min_capital}) must be >= 0"));
                }
                if min_capital >= initial_capital {
                    return Err(format!(
                        "min_capital ({min_capital}) must be below initial_capital ({initial_capital})"
                    ));
                }
                Ok(())
            }
            Self::MaxDrawdown { fraction } => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(format!("drawdown fraction ({fraction}) must be in (0, 1]"));
                }
                Ok(())
            }
        }
    }
}

/// `[account]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Fraction of capital risked per trade, used by risk-fraction lot sizing.
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction: f64,
    #[serde(default)]
    pub boundary: BoundaryRule,
}

fn default_initial_capital() -> f64 {
    10_000.0
}

fn default_risk_fraction() -> f64 {
    0.01
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            risk_fraction: default_risk_fraction(),
            boundary: BoundaryRule::default(),
        }
    }
}

impl AccountConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(format!(
                "initial_capital ({}) must be positive",
                self.initial_capital
            ));
        }
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return Err(format!(
                "risk_fraction ({}) must be in (0, 1]",
                self.risk_fraction
            ));
        }
        self.boundary.validate(self.initial_capital)
    }
}

// ============================================================================
// AccountState
// ============================================================================

#[derive(Debug)]
struct Ledger {
    capital: f64,
    peak: f64,
    cumulative_pnl: f64,
    max_drawdown: f64,
    fills: u64,
}

/// Point-in-time copy of the account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub capital: f64,
    pub peak_capital: f64,
    pub cumulative_pnl: f64,
    /// Largest peak-to-trough decline so far, in capital units.
    pub max_drawdown: f64,
    pub fills: u64,
    pub active: bool,
}

/// Shared account. Wrap in `Arc` and hand to every stage.
#[derive(Debug)]
pub struct AccountState {
    initial_capital: f64,
    risk_fraction: f64,
    boundary: BoundaryRule,
    ledger: Mutex<Ledger>,
    latch: HaltLatch,
}

impl AccountState {
    pub fn new(config: &AccountConfig) -> RiskResult<Self> {
        config.validate().map_err(RiskError::ConfigError)?;
        Ok(Self {
            initial_capital: config.initial_capital,
            risk_fraction: config.risk_fraction,
            boundary: config.boundary,
            ledger: Mutex::new(Ledger {
                capital: config.initial_capital,
                peak: config.initial_capital,
                cumulative_pnl: 0.0,
                max_drawdown: 0.0,
                fills: 0,
            }),
            latch: HaltLatch::new(),
        })
    }

    /// Accumulate realized PnL from one fill, then check the boundary.
    ///
    /// Returns `None` without touching the ledger if trading is halted.
    /// If the fill breaches the boundary, the halt is triggered before the
    /// lock is released.
    pub fn apply_pnl(&self, profit: f64) -> Option<AccountSnapshot> {
        let mut ledger = self.ledger.lock();
        if self.latch.is_triggered() {
            return None;
        }

        ledger.capital += profit;
        ledger.cumulative_pnl += profit;
        ledger.fills += 1;
        if ledger.capital > ledger.peak {
            ledger.peak = ledger.capital;
        }
        let drawdown = ledger.peak - ledger.capital;
        if drawdown > ledger.max_drawdown {
            ledger.max_drawdown = drawdown;
        }

        debug!(
            profit = profit,
            capital = ledger.capital,
            peak = ledger.peak,
            "PnL applied"
        );

        if let Some(reason) = self.boundary.breach(ledger.capital, ledger.peak) {
            self.latch.trigger(reason);
        }

        Some(self.snapshot_locked(&ledger))
    }

    /// `false` once trading is halted. Terminal for the run.
    pub fn is_active(&self) -> bool {
        !self.latch.is_triggered()
    }

    /// Evaluate the boundary rule against the current ledger without halting.
    pub fn check_boundary(&self) -> Option<HaltReason> {
        let ledger = self.ledger.lock();
        self.boundary.breach(ledger.capital, ledger.peak)
    }

    /// Force the halt. Returns `true` if this call performed the transition.
    pub fn force_halt(&self, reason: HaltReason) -> bool {
        let _ledger = self.ledger.lock();
        let halted = self.latch.trigger(reason);
        if halted {
            info!("Account deactivated");
        }
        halted
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.latch.reason()
    }

    /// Wall-clock time trading halted.
    pub fn halted_at(&self) -> Option<DateTime<Utc>> {
        self.latch.triggered_at()
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        let ledger = self.ledger.lock();
        self.snapshot_locked(&ledger)
    }

    pub fn capital(&self) -> f64 {
        self.ledger.lock().capital
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    pub fn boundary(&self) -> BoundaryRule {
        self.boundary
    }

    /// Move capital without the boundary check, leaving a breach unlatched.
    #[cfg(test)]
    pub(crate) fn set_capital_unchecked(&self, capital: f64) {
        self.ledger.lock().capital = capital;
    }

    fn snapshot_locked(&self, ledger: &Ledger) -> AccountSnapshot {
        AccountSnapshot {
            capital: ledger.capital,
            peak_capital: ledger.peak,
            cumulative_pnl: ledger.cumulative_pnl,
            max_drawdown: ledger.max_drawdown,
            fills: ledger.fills,
            active: !self.latch.is_triggered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn account(boundary: BoundaryRule) -> AccountState {
        AccountState::new(&AccountConfig {
            initial_capital: 1000.0,
            risk_fraction: 0.01,
            boundary,
        })
        .unwrap()
    }

    #[test]
    fn test_apply_pnl_tracks_peak_and_drawdown() {
        let account = account(BoundaryRule::Bankruptcy);

        account.apply_pnl(200.0).unwrap();
        account.apply_pnl(-300.0).unwrap();
        let snap = account.apply_pnl(50.0).unwrap();

        assert_eq!(snap.capital, 950.0);
        assert_eq!(snap.peak_capital, 1200.0);
        assert_eq!(snap.cumulative_pnl, -50.0);
        assert_eq!(snap.max_drawdown, 300.0);
        assert_eq!(snap.fills, 3);
        assert!(snap.active);
    }

    #[test]
    fn test_bankruptcy_always_halts() {
        let account = account(BoundaryRule::CapitalFloor { min_capital: 0.0 });

        let snap = account.apply_pnl(-1000.0).unwrap();
        assert_eq!(snap.capital, 0.0);
        assert!(!snap.active);
        assert!(matches!(
            account.halt_reason(),
            Some(HaltReason::Bankrupt { .. })
        ));
    }

    #[test]
    fn test_capital_floor_breach() {
        let account = account(BoundaryRule::CapitalFloor { min_capital: 900.0 });

        assert!(account.apply_pnl(-50.0).unwrap().active);
        let snap = account.apply_pnl(-50.0).unwrap();
        assert!(!snap.active);
        assert_eq!(
            account.halt_reason(),
            Some(HaltReason::BoundaryBreached {
                capital: 900.0,
                limit: 900.0
            })
        );
    }

    #[test]
    fn test_max_drawdown_measured_from_peak() {
        let account = account(BoundaryRule::MaxDrawdown { fraction: 0.25 });

        account.apply_pnl(1000.0).unwrap(); // peak 2000, limit 1500
        assert!(account.apply_pnl(-400.0).unwrap().active);
        assert!(!account.apply_pnl(-100.0).unwrap().active);
    }

    #[test]
    fn test_no_pnl_applied_after_halt() {
        let account = account(BoundaryRule::Bankruptcy);
        assert!(account.force_halt(HaltReason::Manual {
            message: "stop".to_string()
        }));

        assert!(account.apply_pnl(500.0).is_none());
        let snap = account.snapshot();
        assert_eq!(snap.capital, 1000.0);
        assert_eq!(snap.fills, 0);
        assert!(!account.is_active());
    }

    #[test]
    fn test_halt_is_monotonic() {
        let account = account(BoundaryRule::CapitalFloor { min_capital: 900.0 });
        account.apply_pnl(-200.0).unwrap();
        assert!(!account.is_active());

        // Recovery attempts are refused; the halt never resets
        assert!(account.apply_pnl(1000.0).is_none());
        assert!(!account.is_active());
        assert!(!account.force_halt(HaltReason::Manual {
            message: "again".to_string()
        }));
    }

    #[test]
    fn test_check_boundary_does_not_halt() {
        let account = account(BoundaryRule::Bankruptcy);
        assert!(account.check_boundary().is_none());
        assert!(account.is_active());
    }

    #[test]
    fn test_concurrent_apply_pnl() {
        let account = Arc::new(account(BoundaryRule::Bankruptcy));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let account = Arc::clone(&account);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        account.apply_pnl(1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = account.snapshot();
        assert_eq!(snap.fills, 1000);
        assert_eq!(snap.capital, 2000.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(AccountConfig::default().validate().is_ok());

        let bad_capital = AccountConfig {
            initial_capital: 0.0,
            ..Default::default()
        };
        assert!(AccountState::new(&bad_capital).is_err());

        let bad_floor = AccountConfig {
            boundary: BoundaryRule::CapitalFloor {
                min_capital: 20_000.0,
            },
            ..Default::default()
        };
        assert!(bad_floor.validate().is_err());

        let bad_fraction = AccountConfig {
            boundary: BoundaryRule::MaxDrawdown { fraction: 1.5 },
            ..Default::default()
        };
        assert!(bad_fraction.validate().is_err());
    }

    #[test]
    fn test_boundary_from_toml() {
        let config: AccountConfig = toml::from_str(
            r#"
            initial_capital = 5000.0

            [boundary]
            rule = "capital_floor"
            min_capital = 4000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.risk_fraction, 0.01);
        assert_eq!(
            config.boundary,
            BoundaryRule::CapitalFloor {
                min_capital: 4000.0
            }
        );
    }
}
