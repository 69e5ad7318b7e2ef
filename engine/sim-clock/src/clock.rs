//! Core SimClock implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use market_engine::MarketEngine;

use crate::config::ClockConfig;
use crate::error::ClockError;
use crate::metrics::{ClockMetrics, MetricsCollector};

/// The system heartbeat: calls `step_tick()` on the engine at a fixed cadence.
/// The engine itself holds no timers.
pub struct SimClock {
    engine: Arc<Mutex<MarketEngine>>,
    config: ClockConfig,
    is_running: AtomicBool,
    metrics: Arc<MetricsCollector>,
}

impl SimClock {
    pub fn new(engine: Arc<Mutex<MarketEngine>>, config: ClockConfig) -> Self {
        let metrics = Arc::new(MetricsCollector::new(1_000));
        Self { engine, config, is_running: AtomicBool::new(false), metrics }
    }

    pub fn engine(&self) -> Arc<Mutex<MarketEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn metrics(&self) -> ClockMetrics {
        self.metrics.get_metrics()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop after the tick in flight.
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
    }

    /// Run the tick loop until `stop()` or `max_ticks`. The engine lock is
    /// held only for the duration of each `step_tick()`, so order submissions
    /// interleave atomically at tick boundaries.
    pub async fn run_clock_loop(&self) -> Result<(), ClockError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(ClockError::AlreadyRunning);
        }
        info!(cadence_ms = self.config.tick_cadence_ms, "starting clock loop");

        let mut interval = tokio::time::interval(self.config.tick_cadence());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_metrics = Instant::now();

        while self.is_running.load(Ordering::Relaxed) {
            interval.tick().await;
            let start = Instant::now();
            let snapshot = {
                let mut engine = self.engine.lock();
                engine.step_tick()
            };
            self.metrics.record_tick(snapshot.tick, start.elapsed());

            if last_metrics.elapsed() >= self.config.metrics_interval() {
                let m = self.metrics.get_metrics();
                info!(
                    tick = m.current_tick,
                    rate_hz = m.tick_rate_hz,
                    avg_us = m.avg_tick_duration_ns / 1_000,
                    p95_us = m.p95_tick_duration_ns / 1_000,
                    price = snapshot.price,
                    "clock metrics"
                );
                last_metrics = Instant::now();
            }

            if let Some(max) = self.config.max_ticks {
                if snapshot.tick >= max {
                    debug!(tick = snapshot.tick, "max ticks reached, stopping");
                    break;
                }
            }
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("clock loop stopped");
        Ok(())
    }
}
