//! Volfitter
//!
//! Fits implied volatility surfaces on a fixed interval.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volfitter_service::config::{build_config, CliArgs};
use volfitter_service::{FitCycleResult, VolfitterService};

/// Volfitter - periodic implied volatility surface fitter
#[derive(Parser, Debug)]
#[command(name = "volfitter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE", env = "VOLFITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Underlying symbol
    #[arg(short, long)]
    symbol: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Seconds between fit cycles
    #[arg(long)]
    interval: Option<u64>,

    /// Run a single fit cycle and exit
    #[arg(long)]
    once: bool,
}

impl From<&Args> for CliArgs {
    fn from(args: &Args) -> Self {
        CliArgs {
            config_file: args.config.clone(),
            symbol: args.symbol.clone(),
            log_level: args.log_level.clone(),
            fit_interval_secs: args.interval,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_cycle(service: Arc<VolfitterService>) -> Result<FitCycleResult> {
    let result = tokio::task::spawn_blocking(move || service.fit_full_surface())
        .await
        .context("fit cycle panicked")??;
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&CliArgs::from(&args))?;

    init_tracing(&config.log_level.to_lowercase());

    tracing::info!("Volfitter v{}", volfitter_service::VERSION);
    tracing::info!(
        symbol = %config.symbol,
        mode = %config.mode,
        fit_interval_secs = config.fit_interval_secs,
        worker_threads = config.worker_threads,
        "Configuration loaded"
    );

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("failed to build the fitting thread pool")?;

    let service = Arc::new(VolfitterService::from_config(&config)?);

    if args.once {
        let result = run_cycle(service).await?;
        for error in &result.errors {
            tracing::warn!(%error, "Fit cycle completed with errors");
        }
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.fit_interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = run_cycle(Arc::clone(&service)).await {
                    tracing::error!(error = %e, "Fit cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    Ok(())
}
