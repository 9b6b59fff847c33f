//! Triangular FX arbitrage replay simulator - Entry Point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use triarb_bot::{AppConfig, ConfigOverrides, Pipeline};
use triarb_core::ReplayMode;

/// Replay historical FX ticks through the triangular arbitrage pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRIARB_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Historical tick CSV file
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Directory for trade logs and the run summary
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Replay pacing: real-time, fast-forward or slow-motion
    #[arg(short, long)]
    replay_mode: Option<ReplayMode>,

    /// RNG seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    triarb_telemetry::init_logging()?;

    info!("Starting triarb v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(&ConfigOverrides {
        data_file: args.data_file,
        output_dir: args.output_dir,
        replay_mode: args.replay_mode,
        seed: args.seed,
    });
    info!(
        mode = %config.feed.replay_mode,
        target = %config.spread.target,
        "Configuration loaded"
    );

    let pipeline = Pipeline::from_config(config)?;

    let shutdown = pipeline.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let report = pipeline.run().await?;
    let summary = &report.summary;
    info!(
        ticks = report.replay.published,
        trades = summary.total_trades,
        win_rate = %format!("{:.2}%", summary.win_rate * 100.0),
        total_pnl = %format!("{:.2}", summary.total_pnl),
        avg_profit = %format!("{:.2}", summary.average_profit()),
        final_capital = %format!("{:.2}", summary.final_capital),
        max_drawdown = %format!("{:.2}", summary.max_drawdown),
        halt_reason = summary.halt_reason.as_deref().unwrap_or("none"),
        "Run complete"
    );

    Ok(())
}
