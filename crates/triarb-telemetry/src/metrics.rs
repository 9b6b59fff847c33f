//! Prometheus metrics for the triarb pipeline.
//!
//! Covers every stage:
//! - Tick ingestion per instrument
//! - Spread samples, adaptive threshold and emitted trade candidates
//! - Signals by direction
//! - Fills, rejected fills, capital
//! - Trading halts
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a programming error caught on first access.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Gauge, Histogram,
};

/// Ticks ingested from the tick source.
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "triarb_ticks_total",
        "Total ticks published by the tick source",
        &["instrument"]
    )
    .unwrap()
});

/// Ticks dropped by the tick source as malformed.
pub static MALFORMED_TICKS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "triarb_malformed_ticks_total",
        "Total tick records skipped as malformed"
    )
    .unwrap()
});

/// Spread samples fed into the volatility window.
pub static SPREAD_SAMPLES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "triarb_spread_samples_total",
        "Total cross-rate spread samples computed"
    )
    .unwrap()
});

/// Latest spread value.
pub static SPREAD: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("triarb_spread", "Latest cross-rate spread").unwrap());

/// Latest rolling volatility of the spread.
pub static SPREAD_VOLATILITY: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "triarb_spread_volatility",
        "Rolling standard deviation of the spread"
    )
    .unwrap()
});

/// Latest adaptive threshold.
pub static SPREAD_THRESHOLD: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "triarb_spread_threshold",
        "Adaptive spread threshold (baseline + multiplier x volatility)"
    )
    .unwrap()
});

/// Spread events emitted (threshold crossed).
pub static SPREAD_EVENTS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "triarb_spread_events_total",
        "Total trade candidates emitted by the spread estimator"
    )
    .unwrap()
});

/// Signals emitted by the decision stage.
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "triarb_signals_total",
        "Total trade signals emitted",
        &["direction"]
    )
    .unwrap()
});

/// Simulated fills.
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "triarb_fills_total",
        "Total simulated fills",
        &["outcome"]
    )
    .unwrap()
});

/// Orders not converted into fills.
pub static REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "triarb_rejections_total",
        "Total signals not converted into fills",
        &["reason"]
    )
    .unwrap()
});

/// Profit per fill.
pub static FILL_PROFIT: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "triarb_fill_profit",
        "Realized profit per simulated fill",
        vec![-1000.0, -500.0, -100.0, -50.0, -10.0, 0.0, 10.0, 50.0, 100.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Account capital.
pub static CAPITAL: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("triarb_capital", "Simulated account capital").unwrap());

/// Trading halts.
pub static HALTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("triarb_halts_total", "Total trading halts", &["reason"]).unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a published tick.
    pub fn tick_ingested(instrument: &str) {
        TICKS_TOTAL.with_label_values(&[instrument]).inc();
    }

    /// Record a skipped malformed tick record.
    pub fn tick_malformed() {
        MALFORMED_TICKS_TOTAL.inc();
    }

    /// Record a spread sample with the threshold it was judged against.
    pub fn spread_sample(spread: f64, volatility: f64, threshold: f64) {
        SPREAD_SAMPLES_TOTAL.inc();
        SPREAD.set(spread);
        SPREAD_VOLATILITY.set(volatility);
        SPREAD_THRESHOLD.set(threshold);
    }

    /// Record an emitted trade candidate.
    pub fn spread_event() {
        SPREAD_EVENTS_TOTAL.inc();
    }

    /// Record an emitted signal.
    pub fn signal_emitted(direction: &str) {
        SIGNALS_TOTAL.with_label_values(&[direction]).inc();
    }

    /// Record a simulated fill.
    pub fn fill(profit: f64, capital: f64) {
        let outcome = if profit > 0.0 { "win" } else { "loss" };
        FILLS_TOTAL.with_label_values(&[outcome]).inc();
        FILL_PROFIT.observe(profit);
        CAPITAL.set(capital);
    }

    /// Record a signal that did not become a fill.
    pub fn rejected(reason: &str) {
        REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a trading halt.
    pub fn halt(reason: &str) {
        HALTS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Set the capital gauge.
    pub fn capital(capital: f64) {
        CAPITAL.set(capital);
    }
}
