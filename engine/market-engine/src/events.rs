//! Typed outbound events and the bounded queue external consumers poll.
//!
//! The kernel never calls outward: transports and bots drain this queue after
//! each tick. Single-threaded by contract, so a plain ring suffices.

use order_book::{OrderId, Side};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::PriceMode;
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    Fill {
        ts_ms: u64,
        price: f64,
        size: i64,
        taker_side: Side,
        taker_id: PlayerId,
        maker_id: Option<PlayerId>,
        maker_order_id: Option<OrderId>,
    },
    OrderCanceled {
        ts_ms: u64,
        owner_id: PlayerId,
        order_id: OrderId,
        side: Side,
        price: f64,
        remaining: f64,
    },
    OrderExpired {
        ts_ms: u64,
        owner_id: PlayerId,
        order_id: OrderId,
        side: Side,
        price: f64,
        remaining: f64,
    },
    News {
        ts_ms: u64,
        delta: f64,
        text: String,
    },
    TickComplete {
        tick: u64,
        ts_ms: u64,
        price: f64,
        fair: f64,
        mode: PriceMode,
    },
}

/// What to do when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Shed the oldest event to make room (consumers fell behind).
    DropOldest,
    /// Refuse the new event.
    DropNewest,
}

#[derive(Debug)]
pub struct OutboundQueue {
    buf: VecDeque<EngineEvent>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl OutboundQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        assert!(capacity > 0, "outbound queue capacity must be > 0");
        Self { buf: VecDeque::with_capacity(capacity.min(1024)), capacity, policy, dropped: 0 }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if self.buf.len() == self.capacity {
            match self.policy {
                OverflowPolicy::DropOldest => {
                    self.buf.pop_front();
                    self.dropped += 1;
                }
                OverflowPolicy::DropNewest => {
                    self.dropped += 1;
                    return;
                }
            }
        }
        self.buf.push_back(event);
    }

    /// Dequeue up to `max_events`, oldest first.
    pub fn drain(&mut self, max_events: usize) -> Vec<EngineEvent> {
        let n = max_events.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news(ts: u64) -> EngineEvent {
        EngineEvent::News { ts_ms: ts, delta: 1.0, text: "x".into() }
    }

    #[test]
    fn drain_preserves_order() {
        let mut q = OutboundQueue::new(8, OverflowPolicy::DropOldest);
        for ts in 0..5 {
            q.push(news(ts));
        }
        let first = q.drain(3);
        assert_eq!(first.len(), 3);
        assert!(matches!(first[0], EngineEvent::News { ts_ms: 0, .. }));
        let rest = q.drain(100);
        assert_eq!(rest.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn drop_oldest_sheds_from_front() {
        let mut q = OutboundQueue::new(2, OverflowPolicy::DropOldest);
        for ts in 0..4 {
            q.push(news(ts));
        }
        assert_eq!(q.dropped(), 2);
        let events = q.drain(10);
        assert!(matches!(events[0], EngineEvent::News { ts_ms: 2, .. }));
    }

    #[test]
    fn drop_newest_refuses_when_full() {
        let mut q = OutboundQueue::new(2, OverflowPolicy::DropNewest);
        for ts in 0..4 {
            q.push(news(ts));
        }
        assert_eq!(q.dropped(), 2);
        let events = q.drain(10);
        assert!(matches!(events[0], EngineEvent::News { ts_ms: 0, .. }));
        assert!(matches!(events[1], EngineEvent::News { ts_ms: 1, .. }));
    }
}
