//! Analytics snapshots: one row per maintenance pass, kept in a bounded ring
//! for replay and analytics. Not authoritative state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthEntry {
    pub price: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub ts_ms: u64,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub spread: Option<f64>,
    pub mid: Option<f64>,
    pub last_trade: Option<f64>,
    pub bid_depth: Vec<DepthEntry>,
    pub ask_depth: Vec<DepthEntry>,
}

/// Fixed-capacity ring; the oldest row falls off when full.
#[derive(Debug)]
pub struct SnapshotRing {
    buf: VecDeque<BookSnapshot>,
    capacity: usize,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "snapshot ring capacity must be > 0");
        Self { buf: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, snap: BookSnapshot) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(snap);
    }

    pub fn latest(&self) -> Option<&BookSnapshot> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookSnapshot> {
        self.buf.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ts: u64) -> BookSnapshot {
        BookSnapshot {
            ts_ms: ts,
            best_bid: Some(99.5),
            best_ask: Some(100.0),
            spread: Some(0.5),
            mid: Some(99.75),
            last_trade: None,
            bid_depth: vec![],
            ask_depth: vec![],
        }
    }

    #[test]
    fn ring_caps_and_keeps_latest() {
        let mut ring = SnapshotRing::new(3);
        for ts in 0..10 {
            ring.push(snap(ts));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.latest().unwrap().ts_ms, 9);
        let oldest = ring.iter().next().unwrap();
        assert_eq!(oldest.ts_ms, 7);
    }
}
