//! Market simulation service
//!
//! Entry point wiring the market engine and the tick clock, with graceful
//! shutdown handling. Transports poll the engine; none are bundled here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use market_service::{
    graceful_shutdown, initialize_logging, load_configuration, setup_signal_handlers, ServiceState,
};

#[derive(Debug, Parser)]
#[command(name = "market-sim", about = "Single-instrument market simulation service")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks (overrides the config)
    #[arg(long)]
    ticks: Option<u64>,

    /// Tick cadence in milliseconds (overrides the config)
    #[arg(long)]
    cadence_ms: Option<u64>,

    /// Seed for the book and price-process randomness (overrides the config)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_configuration(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(ticks) = args.ticks {
        config.clock.max_ticks = Some(ticks);
    }
    if let Some(cadence) = args.cadence_ms {
        config.clock.tick_cadence_ms = cadence;
        config.engine.tick_interval_ms = cadence;
    }
    if let Some(seed) = args.seed {
        config.engine.seed = seed;
        config.book.seed = seed;
    }

    initialize_logging(&config.logging)?;
    info!("Starting market-sim v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(ServiceState::new(config).context("Failed to initialize service")?);
    let shutdown_signal = setup_signal_handlers()?;

    info!("Starting SimClock...");
    let clock_handle = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = state.run_clock().await {
                error!("SimClock failed: {}", e);
            }
        })
    };

    info!("Starting event pump...");
    let pump_handle = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = state.run_event_pump().await {
                error!("event pump failed: {}", e);
            }
        })
    };

    info!("market-sim is running. Press Ctrl+C to shutdown gracefully.");
    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
        _ = state.clock_done() => {
            info!("Clock finished its run");
        }
    }

    graceful_shutdown(state, clock_handle, pump_handle).await?;
    info!("market-sim shutdown complete");
    Ok(())
}
