//! SimClock - drives the market engine's logical time.
//!
//! The kernel is purely reactive; this crate owns the cadence. One loop calls
//! `MarketEngine::step_tick()` per interval and records timing metrics.

mod clock;
mod config;
mod error;
mod metrics;

pub use clock::SimClock;
pub use config::ClockConfig;
pub use error::ClockError;
pub use metrics::{ClockMetrics, MetricsCollector};

pub const DEFAULT_TICK_CADENCE_MS: u64 = 250;
pub const DEFAULT_METRICS_INTERVAL_MS: u64 = 10_000;
