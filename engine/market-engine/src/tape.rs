//! Bounded trade tape with lookback queries.

use std::collections::VecDeque;

use order_book::Side;
use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ts_ms: u64,
    pub price: f64,
    /// Whole lots. The ledger above the book is always integer-valued.
    pub size: i64,
    pub taker_side: Side,
    pub taker_id: PlayerId,
    /// `None` for fills against ambient liquidity.
    pub maker_id: Option<PlayerId>,
}

#[derive(Debug)]
pub struct TradeTape {
    buf: VecDeque<TradeRecord>,
    capacity: usize,
}

impl TradeTape {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "trade tape capacity must be > 0");
        Self { buf: VecDeque::with_capacity(capacity.min(1024)), capacity }
    }

    pub fn push(&mut self, record: TradeRecord) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(record);
    }

    /// Trades with `ts_ms` inside the lookback window, oldest first.
    pub fn recent(&self, now_ms: u64, window_ms: u64) -> Vec<TradeRecord> {
        let cutoff = now_ms.saturating_sub(window_ms);
        self.buf.iter().filter(|t| t.ts_ms >= cutoff).cloned().collect()
    }

    pub fn last(&self) -> Option<&TradeRecord> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
