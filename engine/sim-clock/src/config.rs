//! Configuration for SimClock

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_METRICS_INTERVAL_MS, DEFAULT_TICK_CADENCE_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Tick cadence in milliseconds. Must match the engine's
    /// `tick_interval_ms` for time-based decay constants to behave.
    pub tick_cadence_ms: u64,

    /// Metrics emission interval in milliseconds.
    pub metrics_interval_ms: u64,

    /// Stop after this many ticks; `None` runs until stopped.
    pub max_ticks: Option<u64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_cadence_ms: DEFAULT_TICK_CADENCE_MS,
            metrics_interval_ms: DEFAULT_METRICS_INTERVAL_MS,
            max_ticks: None,
        }
    }
}

impl ClockConfig {
    pub fn tick_cadence(&self) -> Duration {
        Duration::from_millis(self.tick_cadence_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ClockConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
