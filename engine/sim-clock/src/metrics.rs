//! Tick-timing metrics for SimClock

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Metrics emitted by the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockMetrics {
    pub current_tick: u64,
    pub tick_duration_ns: u64,
    pub tick_rate_hz: f64,
    pub avg_tick_duration_ns: u64,
    pub max_tick_duration_ns: u64,
    pub p95_tick_duration_ns: u64,
    pub uptime_seconds: u64,
    pub total_ticks: u64,
}

/// Collects per-tick durations in a fixed history ring.
pub struct MetricsCollector {
    current_tick: AtomicU64,
    tick_durations: Vec<AtomicU64>,
    max_tick_duration: AtomicU64,
    total_ticks: AtomicU64,
    start_time: Instant,
    history_size: usize,
}

impl MetricsCollector {
    pub fn new(history_size: usize) -> Self {
        assert!(history_size > 0, "history size must be > 0");
        let mut durations = Vec::with_capacity(history_size);
        for _ in 0..history_size {
            durations.push(AtomicU64::new(0));
        }
        Self {
            current_tick: AtomicU64::new(0),
            tick_durations: durations,
            max_tick_duration: AtomicU64::new(0),
            total_ticks: AtomicU64::new(0),
            start_time: Instant::now(),
            history_size,
        }
    }

    pub fn record_tick(&self, tick: u64, duration: Duration) {
        let duration_ns = duration.as_nanos() as u64;
        let index = (tick as usize) % self.history_size;

        self.current_tick.store(tick, Ordering::Relaxed);
        self.tick_durations[index].store(duration_ns, Ordering::Relaxed);
        self.total_ticks.fetch_add(1, Ordering::Relaxed);

        let mut max = self.max_tick_duration.load(Ordering::Relaxed);
        while duration_ns > max {
            match self.max_tick_duration.compare_exchange_weak(
                max,
                duration_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => max = current,
            }
        }
    }

    pub fn get_metrics(&self) -> ClockMetrics {
        let current_tick = self.current_tick.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs();
        let total_ticks = self.total_ticks.load(Ordering::Relaxed);

        let tick_rate_hz =
            if uptime > 0 { total_ticks as f64 / uptime as f64 } else { 0.0 };

        let last_index = (current_tick as usize) % self.history_size;
        let tick_duration_ns = self.tick_durations[last_index].load(Ordering::Relaxed);

        let mut durations: Vec<u64> = self
            .tick_durations
            .iter()
            .map(|d| d.load(Ordering::Relaxed))
            .filter(|&d| d > 0)
            .collect();
        durations.sort_unstable();

        let avg_tick_duration_ns = if durations.is_empty() {
            0
        } else {
            durations.iter().sum::<u64>() / durations.len() as u64
        };
        let p95_tick_duration_ns = if durations.is_empty() {
            0
        } else {
            let index = (durations.len() as f64 * 0.95) as usize;
            durations[index.min(durations.len() - 1)]
        };

        ClockMetrics {
            current_tick,
            tick_duration_ns,
            tick_rate_hz,
            avg_tick_duration_ns,
            max_tick_duration_ns: self.max_tick_duration.load(Ordering::Relaxed),
            p95_tick_duration_ns,
            uptime_seconds: uptime,
            total_ticks,
        }
    }
}
