//! Signal handling for graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

/// Setup signal handlers for graceful shutdown (Ctrl+C, and SIGTERM on unix).
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (relay_tx, mut relay_rx) = tokio::sync::mpsc::channel::<&'static str>(2);

    {
        let relay = relay_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {}", e);
                return;
            }
            let _ = relay.send("SIGINT").await;
        });
    }

    #[cfg(unix)]
    {
        let relay = relay_tx;
        tokio::spawn(async move {
            use signal_hook::consts::SIGTERM;
            use std::sync::atomic::{AtomicBool, Ordering};

            let flag = Arc::new(AtomicBool::new(false));
            if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&flag)) {
                error!("failed to register SIGTERM handler: {}", e);
                return;
            }
            loop {
                if flag.load(Ordering::Relaxed) {
                    let _ = relay.send("SIGTERM").await;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        });
    }

    tokio::spawn(async move {
        if let Some(signal) = relay_rx.recv().await {
            info!("{} received", signal);
            let _ = shutdown_tx.send(());
        }
    });

    Ok(shutdown_rx)
}

/// Stop the clock and wait for the background tasks with a timeout.
pub async fn graceful_shutdown(
    state: Arc<ServiceState>,
    clock_handle: tokio::task::JoinHandle<()>,
    pump_handle: tokio::task::JoinHandle<()>,
) -> Result<()> {
    info!("Starting graceful shutdown...");
    state.shutdown();

    let shutdown_timeout = Duration::from_secs(10);
    for (name, handle) in [("clock", clock_handle), ("event pump", pump_handle)] {
        match timeout(shutdown_timeout, handle).await {
            Ok(Ok(())) => info!("{name} stopped gracefully"),
            Ok(Err(e)) => error!("{name} task failed: {}", e),
            Err(_) => warn!("{name} did not stop within timeout"),
        }
    }

    info!("Graceful shutdown complete");
    Ok(())
}
