//! Player registry entries and average-cost position accounting.

use chrono::{DateTime, Utc};
use order_book::Side;
use serde::{Deserialize, Serialize};

pub type PlayerId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Signed whole-lot position, |position| bounded by the engine cap.
    pub position: i64,
    /// Cost basis of the open position; `None` when flat.
    pub avg_price: Option<f64>,
    /// Cumulative realized PnL.
    pub realized: f64,
    /// Derived each tick from the current price; never accumulated.
    pub pnl: f64,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: 0,
            avg_price: None,
            realized: 0.0,
            pnl: 0.0,
            joined_at: Utc::now(),
        }
    }

    /// Apply one whole-lot fill. Extending blends the cost basis; reducing
    /// realizes PnL on the closed portion; a full reversal re-bases at the
    /// fill price; going flat clears the basis.
    pub fn apply_fill(&mut self, side: Side, size: i64, price: f64) {
        let signed = match side {
            Side::Buy => size,
            Side::Sell => -size,
        };
        if signed == 0 {
            return;
        }
        let pos = self.position;
        if pos == 0 || pos.signum() == signed.signum() {
            let held = pos.abs() as f64;
            let added = signed.abs() as f64;
            let blended = match self.avg_price {
                Some(avg) => (held * avg + added * price) / (held + added),
                None => price,
            };
            self.avg_price = Some(blended);
            self.position = pos + signed;
        } else {
            let avg = self.avg_price.unwrap_or(price);
            let closed = pos.abs().min(signed.abs());
            self.realized += (price - avg) * closed as f64 * pos.signum() as f64;
            let new_pos = pos + signed;
            self.position = new_pos;
            if new_pos == 0 {
                self.avg_price = None;
            } else if new_pos.signum() != pos.signum() {
                self.avg_price = Some(price);
            }
        }
    }

    /// Recompute PnL as a pure function of the current price.
    pub fn mark(&mut self, price: f64) {
        self.pnl = match self.avg_price {
            Some(avg) => (price - avg) * self.position as f64 + self.realized,
            None => self.realized,
        };
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0
    }
}
