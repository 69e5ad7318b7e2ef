//! Service configuration management

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use market_engine::EngineConfig;
use order_book::BookConfig;
use sim_clock::ClockConfig;

/// Main service configuration. Every section has defaults so a missing file
/// or sparse TOML still yields a runnable service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// MarketEngine configuration
    pub engine: EngineConfig,

    /// OrderBook configuration
    pub book: BookConfig,

    /// SimClock configuration
    pub clock: ClockConfig,

    /// Players registered at startup
    pub players: PlayersConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    /// Names registered as players when the service starts.
    pub names: Vec<String>,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self { names: vec!["alpha-bot".into(), "beta-bot".into(), "gamma-bot".into()] }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from an optional TOML file, falling back to defaults.
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: ServiceConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config.engine.validate().context("invalid [engine] section")?;
    config.book.validate().context("invalid [book] section")?;
    Ok(config)
}
