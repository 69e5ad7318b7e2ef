//! Fair-value and traded-price processes.
//!
//! Fair value chases an externally pushed target with a capped per-tick step.
//! The traded price either follows order flow (last trade) or, in news mode,
//! runs a damped-acceleration process toward the smoothed fair value with
//! price-scaled gaussian noise and decaying post-sweep momentum.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use order_book::Side;

use crate::config::{EngineConfig, PriceMode, SweepConfig};

#[derive(Debug)]
pub struct PriceProcess {
    price: f64,
    fair: f64,
    fair_target: f64,
    fair_smoothed: f64,
    velocity: f64,
    /// Signed post-sweep momentum; positive after a buy sweep.
    sweep_pressure: f64,
    rng: StdRng,
}

impl PriceProcess {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            price: cfg.start_price,
            fair: cfg.start_price,
            fair_target: cfg.start_price,
            fair_smoothed: cfg.start_price,
            velocity: 0.0,
            sweep_pressure: 0.0,
            rng: StdRng::seed_from_u64(cfg.seed),
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn fair(&self) -> f64 {
        self.fair
    }

    pub fn fair_target(&self) -> f64 {
        self.fair_target
    }

    pub fn sweep_pressure(&self) -> f64 {
        self.sweep_pressure
    }

    /// Adjust the fair-value target. Never touches fair value directly.
    pub fn push_news(&mut self, delta: f64) {
        self.fair_target += delta;
    }

    /// Register a large one-sided liquidity-consuming trade.
    pub fn record_sweep(&mut self, taker_side: Side, swept_lots: f64, cfg: &SweepConfig) {
        let dir = match taker_side {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        };
        self.sweep_pressure = (self.sweep_pressure + dir * cfg.gain * swept_lots)
            .clamp(-cfg.max_pressure, cfg.max_pressure);
    }

    /// Advance one tick. `last_trade` is the book's last traded price;
    /// `floor` is the lowest admissible price (one tick).
    pub fn step(&mut self, cfg: &EngineConfig, mode: PriceMode, last_trade: Option<f64>, floor: f64) {
        // Fair value regresses toward the target, step capped as a fraction
        // of current fair value so shocks never jump discontinuously.
        let step = (self.fair_target - self.fair) * cfg.fair.regress_frac;
        let cap = cfg.fair.max_step_frac * self.fair.abs().max(floor);
        self.fair += step.clamp(-cap, cap);
        self.fair = self.fair.max(floor);

        match mode {
            PriceMode::Orderflow => {
                if let Some(p) = last_trade {
                    self.price = p;
                }
            }
            PriceMode::News => {
                self.fair_smoothed +=
                    (self.fair - self.fair_smoothed) * cfg.news_mode.fair_smoothing;
                let accel = cfg.news_mode.accel_gain * (self.fair_smoothed - self.price)
                    - cfg.news_mode.damping * self.velocity;
                self.velocity += accel;
                let vcap = cfg.news_mode.max_velocity_frac * self.price;
                self.velocity = self.velocity.clamp(-vcap, vcap);

                let noise = if cfg.news_mode.noise_sigma_frac > 0.0 {
                    let sigma = cfg.news_mode.noise_sigma_frac * self.price;
                    Normal::new(0.0, sigma).expect("sigma is positive").sample(&mut self.rng)
                } else {
                    0.0
                };

                self.price += self.velocity + noise + cfg.sweep.price_gain * self.sweep_pressure;
                self.price = self.price.max(floor);
            }
        }

        self.sweep_pressure *= 1.0 - cfg.sweep.decay;
        if self.sweep_pressure.abs() < 1e-9 {
            self.sweep_pressure = 0.0;
        }
    }
}
