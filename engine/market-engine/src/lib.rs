//! MarketEngine - single-instrument market simulation kernel.
//!
//! Owns the fair-value/price process, the player registry, position and PnL
//! accounting, the trade tape and news events. All matching is delegated to
//! the `order-book` crate. Purely reactive and synchronous: an external tick
//! driver calls `step_tick()` at a fixed cadence.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod news;
pub mod player;
pub mod price;
pub mod tape;

pub use config::{EngineConfig, EngineConfigError, FairValueConfig, NewsModeConfig, PriceMode, SweepConfig};
pub use engine::{
    FillView, MarketEngine, OrderBookView, OrderKind, OrderResponse, OrderSpec, RejectReason,
    TickSnapshot,
};
pub use error::EngineError;
pub use events::{EngineEvent, OutboundQueue, OverflowPolicy};
pub use news::NewsEvent;
pub use player::{Player, PlayerId};
pub use tape::TradeRecord;

// Re-export the book surface engine callers commonly need.
pub use order_book::{BookConfig, LevelView, OrderId, RestingOrderView, Side, TopOfBook};
