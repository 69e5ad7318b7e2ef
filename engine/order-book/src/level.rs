//! Price levels and the resting orders queued at them.

use std::collections::VecDeque;

use crate::config::BookConfig;
use crate::types::{OrderId, OwnerId, Side, Volume, EPS};

/// An owned, cancelable order resting at a price level. Large parents display
/// only a clip of their size; the rest waits in `hidden_remaining`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub id: OrderId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub price: f64,
    /// Currently displayed quantity. Never negative.
    pub remaining: Volume,
    /// Undisplayed iceberg reserve. Never negative.
    pub hidden_remaining: Volume,
    /// Clip size the order tries to show after each refresh.
    pub display_target: Volume,
    pub created_at: u64,
    pub next_refresh_at: u64,
}

impl RestingOrder {
    /// Split `qty` into an initial display clip and hidden reserve per the
    /// iceberg rules, and schedule the first refresh.
    pub fn new(
        cfg: &BookConfig,
        id: OrderId,
        owner_id: OwnerId,
        side: Side,
        price: f64,
        qty: Volume,
        now_ms: u64,
    ) -> Self {
        let (display, hidden) = if qty > cfg.iceberg_min_parent {
            let clip = (qty * cfg.display_fraction).max(cfg.min_clip).min(qty);
            (clip, qty - clip)
        } else {
            (qty, 0.0)
        };
        Self {
            id,
            owner_id,
            side,
            price,
            remaining: display,
            hidden_remaining: hidden,
            display_target: display,
            created_at: now_ms,
            next_refresh_at: now_ms + cfg.refresh_interval_ms,
        }
    }

    pub fn total_remaining(&self) -> Volume {
        self.remaining + self.hidden_remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= EPS && self.hidden_remaining <= EPS
    }

    /// Top the displayed clip back up from the hidden reserve. Returns false
    /// when there is nothing left to show.
    pub fn refresh_clip(&mut self, cfg: &BookConfig, now_ms: u64) -> bool {
        if self.hidden_remaining <= EPS {
            return false;
        }
        let want = (self.display_target - self.remaining).max(0.0);
        let clip = want.min(self.hidden_remaining);
        self.hidden_remaining -= clip;
        self.remaining += clip;
        self.next_refresh_at = now_ms + cfg.refresh_interval_ms;
        true
    }
}

/// One price point on one side of the book: ambient (ownerless) `base`
/// volume plus a FIFO of resting orders in time priority.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub side: Side,
    pub price: f64,
    /// Ambient baseline liquidity. Regenerated each tick, consumable but not
    /// cancelable.
    pub base: Volume,
    pub orders: VecDeque<RestingOrder>,
}

impl PriceLevel {
    pub fn new(side: Side, price: f64) -> Self {
        Self { side, price, base: 0.0, orders: VecDeque::new() }
    }

    /// Sum of displayed resting remainders.
    pub fn manual_volume(&self) -> Volume {
        self.orders.iter().map(|o| o.remaining).sum()
    }

    /// Displayed volume at this level is always `base + manual_volume`.
    pub fn total_volume(&self) -> Volume {
        self.base + self.manual_volume()
    }

    /// A level with neither ambient nor resting volume is removed from the book.
    pub fn is_dead(&self) -> bool {
        self.orders.is_empty() && self.base <= EPS
    }

    pub fn push_back(&mut self, order: RestingOrder) {
        self.orders.push_back(order);
    }

    /// Move an order (by queue position) to the back of time priority.
    pub fn requeue_back(&mut self, pos: usize) {
        if let Some(o) = self.orders.remove(pos) {
            self.orders.push_back(o);
        }
    }

    pub fn remove_order(&mut self, id: OrderId) -> Option<RestingOrder> {
        let pos = self.orders.iter().position(|o| o.id == id)?;
        self.orders.remove(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BookConfig {
        BookConfig::default()
    }

    #[test]
    fn small_order_rests_fully_displayed() {
        let o = RestingOrder::new(&cfg(), 1, 9, Side::Buy, 100.0, 10.0, 0);
        assert_eq!(o.remaining, 10.0);
        assert_eq!(o.hidden_remaining, 0.0);
    }

    #[test]
    fn large_order_splits_into_iceberg() {
        let c = cfg();
        let o = RestingOrder::new(&c, 1, 9, Side::Sell, 100.0, 100.0, 0);
        assert!(o.remaining >= c.min_clip);
        assert!(o.remaining < 100.0);
        assert!((o.remaining + o.hidden_remaining - 100.0).abs() < EPS);
        assert_eq!(o.next_refresh_at, c.refresh_interval_ms);
    }

    #[test]
    fn refresh_pulls_from_hidden() {
        let c = cfg();
        let mut o = RestingOrder::new(&c, 1, 9, Side::Sell, 100.0, 100.0, 0);
        let before_hidden = o.hidden_remaining;
        o.remaining = 0.1; // nearly drained clip
        assert!(o.refresh_clip(&c, 5_000));
        assert!(o.remaining > 0.1);
        assert!(o.hidden_remaining < before_hidden);
        assert_eq!(o.next_refresh_at, 5_000 + c.refresh_interval_ms);
    }

    #[test]
    fn refresh_without_reserve_fails() {
        let c = cfg();
        let mut o = RestingOrder::new(&c, 1, 9, Side::Sell, 100.0, 10.0, 0);
        o.remaining = 0.0;
        assert!(!o.refresh_clip(&c, 0));
        assert!(o.is_exhausted());
    }

    #[test]
    fn level_volume_is_base_plus_manual() {
        let c = cfg();
        let mut lvl = PriceLevel::new(Side::Buy, 100.0);
        lvl.base = 40.0;
        lvl.push_back(RestingOrder::new(&c, 1, 9, Side::Buy, 100.0, 10.0, 0));
        lvl.push_back(RestingOrder::new(&c, 2, 9, Side::Buy, 100.0, 5.0, 0));
        assert!((lvl.manual_volume() - 15.0).abs() < EPS);
        assert!((lvl.total_volume() - 55.0).abs() < EPS);
        assert!(!lvl.is_dead());
    }

    #[test]
    fn requeue_moves_to_back() {
        let c = cfg();
        let mut lvl = PriceLevel::new(Side::Sell, 100.0);
        for id in 1..=3 {
            lvl.push_back(RestingOrder::new(&c, id, 9, Side::Sell, 100.0, 10.0, 0));
        }
        lvl.requeue_back(0);
        let ids: Vec<_> = lvl.orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
