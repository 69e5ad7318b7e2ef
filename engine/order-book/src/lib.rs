//! Single-instrument limit order book.
//!
//! Owns price levels, resting orders, ambient baseline liquidity and the
//! matching algorithm. Knows nothing about participants' economic accounting;
//! that lives in `market-engine`.

mod book;
mod config;
mod events;
mod level;
mod snapshot;
mod types;

pub use book::{OrderBook, PlaceResult};
pub use config::{BookConfig, BookConfigError};
pub use events::BookEvent;
pub use level::{PriceLevel, RestingOrder};
pub use snapshot::{BookSnapshot, DepthEntry, SnapshotRing};
pub use types::{
    CanceledOrder, Fill, LevelView, MatchResult, OrderId, OwnerId, PriceKey, RestingOrderView,
    Side, TopOfBook, Volume, EPS,
};
