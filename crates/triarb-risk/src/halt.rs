//! Trading halt latch.
//!
//! Once triggered the latch stays triggered for the rest of the run; there is
//! no reset. The first reason wins.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{error, warn};

// ============================================================================
// HaltReason
// ============================================================================

/// Reason trading was halted.
#[derive(Debug, Clone, PartialEq)]
pub enum HaltReason {
    /// Capital reached zero or below.
    Bankrupt {
        capital: f64,
    },
    /// Configured boundary rule breached.
    BoundaryBreached {
        capital: f64,
        /// Capital level at which the rule trips.
        limit: f64,
    },
    /// Forced by the risk monitor.
    RiskMonitor {
        event: String,
    },
    /// Operator request.
    Manual {
        message: String,
    },
}

impl HaltReason {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bankrupt { .. } => "bankrupt",
            Self::BoundaryBreached { .. } => "boundary",
            Self::RiskMonitor { .. } => "risk_monitor",
            Self::Manual { .. } => "manual",
        }
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bankrupt { capital } => write!(f, "Bankrupt: capital {:.2}", capital),
            Self::BoundaryBreached { capital, limit } => {
                write!(f, "Boundary breached: capital {:.2} <= {:.2}", capital, limit)
            }
            Self::RiskMonitor { event } => write!(f, "RiskMonitor: {}", event),
            Self::Manual { message } => write!(f, "Manual: {}", message),
        }
    }
}

// ============================================================================
// HaltLatch
// ============================================================================

/// Terminal halt flag.
///
/// Thread-safe: shared across stages inside `AccountState`.
#[derive(Debug)]
pub struct HaltLatch {
    triggered: AtomicBool,
    reason: RwLock<Option<(HaltReason, DateTime<Utc>)>>,
}

impl Default for HaltLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl HaltLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            reason: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Trigger the halt.
    ///
    /// Returns `true` if this call performed the transition. Later calls are
    /// no-ops and keep the original reason.
    pub fn trigger(&self, reason: HaltReason) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.reason.write() = Some((reason.clone(), Utc::now()));
            error!(reason = %reason, "TRADING HALTED");
            true
        } else {
            warn!(new_reason = %reason, "Trading already halted, ignoring new trigger");
            false
        }
    }

    /// Reason for the halt, `None` if not triggered.
    #[must_use]
    pub fn reason(&self) -> Option<HaltReason> {
        self.reason.read().as_ref().map(|(reason, _)| reason.clone())
    }

    /// Wall-clock time of the halt, `None` if not triggered.
    #[must_use]
    pub fn triggered_at(&self) -> Option<DateTime<Utc>> {
        self.reason.read().as_ref().map(|(_, at)| *at)
    }
}
