//! News events: fair-value shocks pushed from outside, kept in a bounded log.
//! Independent of the order book.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub ts_ms: u64,
    /// Fair-value target adjustment carried by this event.
    pub delta: f64,
    pub sign: i8,
    pub text: String,
}

const BULLISH: &[&str] = &[
    "Upgraded guidance lifts outlook",
    "Surprise demand spike reported",
    "Major buyer enters the market",
    "Supply disruption tightens availability",
];

const BEARISH: &[&str] = &[
    "Guidance cut rattles holders",
    "Inventory glut weighs on outlook",
    "Key customer walks away",
    "Regulatory probe announced",
];

const NEUTRAL: &[&str] = &["Mixed signals leave traders unmoved"];

/// Pick a headline matching the shock's direction.
pub fn headline_for(delta: f64, rng: &mut StdRng) -> String {
    let pool = if delta > 0.0 {
        BULLISH
    } else if delta < 0.0 {
        BEARISH
    } else {
        NEUTRAL
    };
    pool[rng.gen_range(0..pool.len())].to_string()
}

#[derive(Debug)]
pub struct NewsLog {
    buf: VecDeque<NewsEvent>,
    capacity: usize,
}

impl NewsLog {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "news log capacity must be > 0");
        Self { buf: VecDeque::with_capacity(capacity.min(256)), capacity }
    }

    pub fn push(&mut self, event: NewsEvent) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(event);
    }

    /// Events with `ts_ms` inside the lookback window, oldest first.
    pub fn recent(&self, now_ms: u64, lookback_ms: u64) -> Vec<NewsEvent> {
        let cutoff = now_ms.saturating_sub(lookback_ms);
        self.buf.iter().filter(|e| e.ts_ms >= cutoff).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
