use core::fmt;

use serde::{Deserialize, Serialize};

pub type OrderId = u64;
pub type OwnerId = u64;

/// Price quantized to an integral number of ticks. Level-table key.
pub type PriceKey = i64;

/// Displayed volumes inside the book are fractional (ambient decay); the
/// ledger above the book rounds to whole lots.
pub type Volume = f64;

pub const EPS: Volume = 1e-9;

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One liquidity consumption during a match. `owner_id`/`order_id` are `None`
/// when the fill came out of ambient baseline volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: f64,
    pub size: Volume,
    pub owner_id: Option<OwnerId>,
    pub order_id: Option<OrderId>,
}

/// Outcome of crossing the book with a (possibly limit-bounded) market order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub filled: Volume,
    pub avg_price: Option<f64>,
    pub fills: Vec<Fill>,
    pub remainder: Volume,
}

impl MatchResult {
    pub fn none(requested: Volume) -> Self {
        Self { filled: 0.0, avg_price: None, fills: Vec::new(), remainder: requested.max(0.0) }
    }

    /// Number of distinct price levels this match consumed from.
    pub fn levels_swept(&self) -> usize {
        let mut prices: Vec<i64> = self.fills.iter().map(|f| (f.price * 1e6) as i64).collect();
        prices.sort_unstable();
        prices.dedup();
        prices.len()
    }
}

/// Deep-copied view of a resting order, safe to hand to transports and bots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrderView {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub price: f64,
    pub remaining_units: i64,
    pub displayed: Volume,
    pub hidden: Volume,
    pub created_at_ms: u64,
}

/// Deep-copied view of one price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelView {
    pub price: f64,
    pub base: Volume,
    pub manual: Volume,
    pub total: Volume,
    pub order_count: usize,
}

/// Top-of-book view, best levels first on both sides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bids: Vec<LevelView>,
    pub asks: Vec<LevelView>,
    pub spread: Option<f64>,
    pub mid: Option<f64>,
}

/// Descriptor returned for each removed order by the cancel operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanceledOrder {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub price: f64,
    pub remaining: Volume,
    pub hidden: Volume,
}
