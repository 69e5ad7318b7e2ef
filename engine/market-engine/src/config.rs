use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the traded price evolves each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    /// Price only changes as a consequence of executed trades.
    Orderflow,
    /// Damped-acceleration pull toward a smoothed fair value, plus noise and
    /// sweep pressure.
    News,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FairValueConfig {
    /// Fraction of the gap to the pushed target covered per tick.
    pub regress_frac: f64,
    /// Per-tick step cap as a fraction of current fair value.
    pub max_step_frac: f64,
}

impl Default for FairValueConfig {
    fn default() -> Self {
        Self { regress_frac: 0.15, max_step_frac: 0.0075 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsModeConfig {
    /// Pull strength toward the smoothed fair value.
    pub accel_gain: f64,
    /// Velocity damping per tick.
    pub damping: f64,
    /// Gaussian noise sigma as a fraction of current price.
    pub noise_sigma_frac: f64,
    /// Velocity cap as a fraction of current price.
    pub max_velocity_frac: f64,
    /// Smoothing factor for the fair value the price chases.
    pub fair_smoothing: f64,
}

impl Default for NewsModeConfig {
    fn default() -> Self {
        Self {
            accel_gain: 0.08,
            damping: 0.55,
            noise_sigma_frac: 0.0008,
            max_velocity_frac: 0.01,
            fair_smoothing: 0.2,
        }
    }
}

/// Post-sweep momentum. Constants are calibration choices; the contract is a
/// spike after a multi-level one-sided trade and geometric decay after.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// A single order must consume at least this many levels to register.
    pub min_levels: usize,
    /// Pressure added per swept lot.
    pub gain: f64,
    /// Absolute pressure clamp.
    pub max_pressure: f64,
    /// Fraction of pressure shed per tick.
    pub decay: f64,
    /// Price impact per unit of pressure, applied in news mode.
    pub price_gain: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { min_levels: 2, gain: 1.0, max_pressure: 500.0, decay: 0.25, price_gain: 0.002 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub start_price: f64,
    /// Absolute position cap per player, in lots.
    pub max_position: i64,
    pub mode: PriceMode,
    /// Logical time advanced per tick. The tick driver must call at this cadence.
    pub tick_interval_ms: u64,
    pub tape_capacity: usize,
    pub news_capacity: usize,
    pub event_queue_capacity: usize,
    /// Seed for the price-process noise and headline choice. Injected so runs
    /// are reproducible.
    pub seed: u64,
    pub fair: FairValueConfig,
    pub news_mode: NewsModeConfig,
    pub sweep: SweepConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            max_position: 250,
            mode: PriceMode::Orderflow,
            tick_interval_ms: 250,
            tape_capacity: 4096,
            news_capacity: 256,
            event_queue_capacity: 8192,
            seed: 0,
            fair: FairValueConfig::default(),
            news_mode: NewsModeConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineConfigError {
    #[error("start_price must be positive")]
    InvalidStartPrice,
    #[error("max_position must be positive")]
    InvalidMaxPosition,
    #[error("tick_interval_ms must be nonzero")]
    InvalidTickInterval,
    #[error("tape_capacity and news_capacity must be nonzero")]
    EmptyLog,
    #[error("fair regress_frac must be in (0, 1]")]
    BadRegressFrac,
    #[error("sweep decay must be in (0, 1]")]
    BadSweepDecay,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if !(self.start_price > 0.0) {
            return Err(EngineConfigError::InvalidStartPrice);
        }
        if self.max_position <= 0 {
            return Err(EngineConfigError::InvalidMaxPosition);
        }
        if self.tick_interval_ms == 0 {
            return Err(EngineConfigError::InvalidTickInterval);
        }
        if self.tape_capacity == 0 || self.news_capacity == 0 {
            return Err(EngineConfigError::EmptyLog);
        }
        if !(self.fair.regress_frac > 0.0 && self.fair.regress_frac <= 1.0) {
            return Err(EngineConfigError::BadRegressFrac);
        }
        if !(self.sweep.decay > 0.0 && self.sweep.decay <= 1.0) {
            return Err(EngineConfigError::BadSweepDecay);
        }
        Ok(())
    }
}
