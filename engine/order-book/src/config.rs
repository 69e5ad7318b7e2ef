use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for the order book: price grid, ambient baseline liquidity,
/// iceberg display and resting-order aging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Price grid step. Every price entering the book is snapped to this.
    pub tick_size: f64,

    /// How many price levels per side receive ambient baseline volume.
    pub levels_per_side: u32,

    /// Ambient target volume at the level nearest the mid, in lots.
    pub base_depth: f64,

    /// Geometric falloff of ambient target volume with distance from mid.
    pub depth_falloff: f64,

    /// Ambient target clamp, in lots.
    pub min_volume: f64,
    pub max_volume: f64,

    /// Fraction of the gap to target recovered per maintenance pass when the
    /// level is below target.
    pub regen_rate: f64,

    /// Fraction of the excess shed per maintenance pass when above target.
    pub excess_decay: f64,

    /// Uniform jitter applied to ambient targets, as a fraction (0.05 = ±5%).
    pub base_jitter: f64,

    /// Weight of fair value when nudging the baseline anchor off the mid.
    pub fair_nudge: f64,

    /// Cap on manually resting volume per level, in lots.
    pub max_level_size: f64,

    /// Orders larger than this rest as icebergs.
    pub iceberg_min_parent: f64,

    /// Fraction of an iceberg parent shown per clip.
    pub display_fraction: f64,

    /// Smallest clip an iceberg will display, in lots.
    pub min_clip: f64,

    /// Scheduled iceberg refresh interval.
    pub refresh_interval_ms: u64,

    /// Resting-order aging half-life; decay starts at half this age.
    pub half_life_ms: u64,

    /// Per-pass decay base applied as `passive_decay^(age/half_life)`.
    pub passive_decay: f64,

    /// Resting orders older than this are force-expired.
    pub max_age_ms: u64,

    /// Analytics snapshot ring capacity.
    pub snapshot_capacity: usize,

    /// Seed for the book's jitter source. Injected so runs are reproducible.
    pub seed: u64,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            tick_size: 0.5,
            levels_per_side: 8,
            base_depth: 120.0,
            depth_falloff: 0.35,
            min_volume: 5.0,
            max_volume: 400.0,
            regen_rate: 0.25,
            excess_decay: 0.15,
            base_jitter: 0.08,
            fair_nudge: 0.25,
            max_level_size: 500.0,
            iceberg_min_parent: 30.0,
            display_fraction: 0.35,
            min_clip: 8.0,
            refresh_interval_ms: 4_000,
            half_life_ms: 30_000,
            passive_decay: 0.92,
            max_age_ms: 120_000,
            snapshot_capacity: 400,
            seed: 0,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookConfigError {
    #[error("tick_size must be positive")]
    InvalidTick,
    #[error("levels_per_side must be nonzero")]
    NoLevels,
    #[error("volume clamp is empty (min_volume > max_volume)")]
    EmptyVolumeClamp,
    #[error("display_fraction must be in (0, 1]")]
    BadDisplayFraction,
    #[error("passive_decay must be in (0, 1]")]
    BadPassiveDecay,
    #[error("regen_rate and excess_decay must be in (0, 1]")]
    BadRegenRate,
    #[error("snapshot_capacity must be nonzero")]
    NoSnapshots,
}

impl BookConfig {
    pub fn validate(&self) -> Result<(), BookConfigError> {
        if !(self.tick_size > 0.0) {
            return Err(BookConfigError::InvalidTick);
        }
        if self.levels_per_side == 0 {
            return Err(BookConfigError::NoLevels);
        }
        if self.min_volume > self.max_volume {
            return Err(BookConfigError::EmptyVolumeClamp);
        }
        if !(self.display_fraction > 0.0 && self.display_fraction <= 1.0) {
            return Err(BookConfigError::BadDisplayFraction);
        }
        if !(self.passive_decay > 0.0 && self.passive_decay <= 1.0) {
            return Err(BookConfigError::BadPassiveDecay);
        }
        if !(self.regen_rate > 0.0 && self.regen_rate <= 1.0)
            || !(self.excess_decay > 0.0 && self.excess_decay <= 1.0)
        {
            return Err(BookConfigError::BadRegenRate);
        }
        if self.snapshot_capacity == 0 {
            return Err(BookConfigError::NoSnapshots);
        }
        Ok(())
    }

    /// Displayed remainder below this triggers an iceberg refresh.
    pub fn refresh_threshold(&self) -> f64 {
        0.06 * self.min_volume
    }

    /// Displayed remainder below this (with no hidden reserve) expires the order.
    pub fn expiry_threshold(&self) -> f64 {
        0.02 * self.min_volume
    }
}
