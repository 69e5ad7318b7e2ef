use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OwnerId, Side, Volume};

/// Book-level lifecycle records. The book never calls outward: it accumulates
/// these per operation and the owner drains them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookEvent {
    /// A resting order aged out or fell below the expiry threshold.
    Expired {
        order_id: OrderId,
        owner_id: OwnerId,
        side: Side,
        price: f64,
        remaining: Volume,
    },
    /// An iceberg pulled a fresh display clip and moved to the back of its
    /// level's time priority.
    Refreshed { order_id: OrderId, owner_id: OwnerId, price: f64, displayed: Volume },
    /// A level with no manual orders and negligible volume was removed.
    LevelPruned { side: Side, price: f64 },
}
