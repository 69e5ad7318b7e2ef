//! Two-ladder order book: bids and asks as explicit level tables keyed by
//! quantized price, an owner index for O(owned-orders) cancellation, and the
//! matching algorithm (price-time priority, ambient baseline consumed after
//! manual orders).

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{BookConfig, BookConfigError};
use crate::events::BookEvent;
use crate::level::{PriceLevel, RestingOrder};
use crate::snapshot::{BookSnapshot, DepthEntry, SnapshotRing};
use crate::types::{
    CanceledOrder, Fill, LevelView, MatchResult, OrderId, OwnerId, PriceKey, RestingOrderView,
    Side, TopOfBook, Volume, EPS,
};

/// Outcome of a limit placement: the crossing fills plus whatever rested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceResult {
    pub match_result: MatchResult,
    pub resting: Option<RestingOrderView>,
    /// Portion refused because the level had no remaining capacity.
    pub rejected_remainder: Volume,
}

pub struct OrderBook {
    cfg: BookConfig,
    bids: BTreeMap<PriceKey, PriceLevel>,
    asks: BTreeMap<PriceKey, PriceLevel>,
    /// ownerId -> ids of that owner's resting orders.
    owner_index: HashMap<OwnerId, BTreeSet<OrderId>>,
    /// orderId -> (side, level key). Kept consistent with the level lists.
    locator: HashMap<OrderId, (Side, PriceKey)>,
    next_order_id: OrderId,
    last_trade_price: Option<f64>,
    now_ms: u64,
    rng: StdRng,
    snapshots: SnapshotRing,
    events: Vec<BookEvent>,
}

impl OrderBook {
    pub fn new(cfg: BookConfig) -> Result<Self, BookConfigError> {
        cfg.validate()?;
        let snapshots = SnapshotRing::new(cfg.snapshot_capacity);
        let rng = StdRng::seed_from_u64(cfg.seed);
        Ok(Self {
            cfg,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            owner_index: HashMap::new(),
            locator: HashMap::new(),
            next_order_id: 1,
            last_trade_price: None,
            now_ms: 0,
            rng,
            snapshots,
            events: Vec::new(),
        })
    }

    /// Snap a price to the grid, floor-clamped to one tick.
    pub fn quantize(&self, price: f64) -> f64 {
        let t = self.cfg.tick_size;
        ((price / t).round() * t).max(t)
    }

    fn key_of(&self, price: f64) -> PriceKey {
        (self.quantize(price) / self.cfg.tick_size).round() as PriceKey
    }

    fn price_of(&self, key: PriceKey) -> f64 {
        key as f64 * self.cfg.tick_size
    }

    pub fn config(&self) -> &BookConfig {
        &self.cfg
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn last_trade_price(&self) -> Option<f64> {
        self.last_trade_price
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next_back().map(|&k| self.price_of(k))
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|&k| self.price_of(k))
    }

    pub fn mid(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some((a + b) / 2.0),
            _ => self.last_trade_price,
        }
    }

    pub fn resting_order_count(&self) -> usize {
        self.locator.len()
    }

    pub fn level_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    /// Take everything accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<BookEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshots(&self) -> &SnapshotRing {
        &self.snapshots
    }

    // ---- matching ----------------------------------------------------------

    /// Cross the book with a taker on `side` for `qty` lots, best opposing
    /// level first, bounded by `limit_price` when given. Within a level,
    /// resting orders are consumed strictly in arrival order before ambient
    /// baseline. Zero or negative `qty` is a no-op.
    pub fn execute_market_order(
        &mut self,
        side: Side,
        qty: Volume,
        limit_price: Option<f64>,
    ) -> MatchResult {
        if qty <= 0.0 {
            return MatchResult::none(0.0);
        }
        let limit_key = limit_price.map(|p| self.key_of(p));
        let mut need = qty;
        let mut fills: Vec<Fill> = Vec::new();
        let mut notional = 0.0;

        while need > EPS {
            let key = match side {
                Side::Buy => self.asks.keys().next().copied(),
                Side::Sell => self.bids.keys().next_back().copied(),
            };
            let Some(key) = key else { break };
            if let Some(limit) = limit_key {
                let within = match side {
                    Side::Buy => key <= limit,
                    Side::Sell => key >= limit,
                };
                if !within {
                    break;
                }
            }
            self.consume_level(side.opposite(), key, &mut need, &mut fills, &mut notional);
        }

        if let Some(last) = fills.last() {
            self.last_trade_price = Some(last.price);
        }
        let filled = qty - need;
        let (filled, remainder) =
            if need <= EPS { (qty, 0.0) } else { (filled.max(0.0), need) };
        let avg_price = if filled > EPS { Some(notional / filled) } else { None };
        MatchResult { filled, avg_price, fills, remainder }
    }

    /// Drain one level at `key` on `book_side` into `fills`. Prunes the level
    /// if it comes out dead.
    fn consume_level(
        &mut self,
        book_side: Side,
        key: PriceKey,
        need: &mut Volume,
        fills: &mut Vec<Fill>,
        notional: &mut f64,
    ) {
        let price = self.price_of(key);
        let now = self.now_ms;
        let mut finalized: Vec<RestingOrder> = Vec::new();
        let mut dead = false;
        {
            let level = match book_side {
                Side::Buy => self.bids.get_mut(&key),
                Side::Sell => self.asks.get_mut(&key),
            };
            let Some(level) = level else { return };

            // Manual orders first, strictly in arrival order.
            while *need > EPS {
                let Some(front) = level.orders.front_mut() else { break };
                let take = need.min(front.remaining);
                if take > EPS {
                    front.remaining -= take;
                    *need -= take;
                    *notional += take * price;
                    fills.push(Fill {
                        price,
                        size: take,
                        owner_id: Some(front.owner_id),
                        order_id: Some(front.id),
                    });
                }
                if front.remaining <= EPS {
                    // Drained: one immediate forced refresh if reserve remains,
                    // otherwise finalize in the same operation.
                    if front.hidden_remaining > EPS {
                        front.refresh_clip(&self.cfg, now);
                        self.events.push(BookEvent::Refreshed {
                            order_id: front.id,
                            owner_id: front.owner_id,
                            price,
                            displayed: front.remaining,
                        });
                        level.requeue_back(0);
                    } else {
                        let done = level.orders.pop_front().expect("front exists");
                        finalized.push(done);
                    }
                } else {
                    break;
                }
            }

            // Then ambient baseline.
            if *need > EPS && level.base > EPS {
                let take = need.min(level.base);
                level.base -= take;
                *need -= take;
                *notional += take * price;
                fills.push(Fill { price, size: take, owner_id: None, order_id: None });
            }

            if level.is_dead() {
                dead = true;
            }
        }

        for o in &finalized {
            self.unindex(o.id, o.owner_id);
        }
        if dead {
            match book_side {
                Side::Buy => self.bids.remove(&key),
                Side::Sell => self.asks.remove(&key),
            };
            self.events.push(BookEvent::LevelPruned { side: book_side, price });
            trace!(side = %book_side, price, "level pruned after sweep");
        }
    }

    // ---- placement ---------------------------------------------------------

    /// Cross up to the limit price exactly as a market order would, then rest
    /// the remainder at the limit, bounded by the level's remaining capacity.
    /// A remainder the level cannot hold at all is rejected, not queued.
    pub fn place_limit_order(
        &mut self,
        owner_id: OwnerId,
        side: Side,
        price: f64,
        qty: Volume,
    ) -> PlaceResult {
        if qty <= 0.0 {
            return PlaceResult::default();
        }
        let price = self.quantize(price);
        let match_result = self.execute_market_order(side, qty, Some(price));
        let remainder = match_result.remainder;
        if remainder <= EPS {
            return PlaceResult { match_result, resting: None, rejected_remainder: 0.0 };
        }
        let (resting, rejected) = self.rest_order(owner_id, side, price, remainder);
        PlaceResult { match_result, resting, rejected_remainder: rejected }
    }

    /// Queue `qty` at `price` without crossing. Used for limit remainders and
    /// for market-order remainders resting at the current price.
    pub fn rest_order(
        &mut self,
        owner_id: OwnerId,
        side: Side,
        price: f64,
        qty: Volume,
    ) -> (Option<RestingOrderView>, Volume) {
        if qty <= 0.0 {
            return (None, 0.0);
        }
        let price = self.quantize(price);
        let key = self.key_of(price);
        let now = self.now_ms;

        let id = self.next_order_id;
        let view;
        {
            let ladder = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = ladder.entry(key).or_insert_with(|| PriceLevel::new(side, price));
            let capacity = self.cfg.max_level_size - level.manual_volume();
            if capacity < 1.0 {
                let dead = level.is_dead();
                if dead {
                    ladder.remove(&key);
                }
                debug!(owner_id, %side, price, qty, "resting rejected: level at capacity");
                return (None, qty);
            }
            let rest_qty = qty.min(capacity);
            let order = RestingOrder::new(&self.cfg, id, owner_id, side, price, rest_qty, now);
            view = RestingOrderView {
                order_id: id,
                owner_id,
                side,
                price,
                remaining_units: order.total_remaining().round() as i64,
                displayed: order.remaining,
                hidden: order.hidden_remaining,
                created_at_ms: now,
            };
            level.push_back(order);
            self.next_order_id += 1;
        }
        self.locator.insert(id, (side, key));
        self.owner_index.entry(owner_id).or_default().insert(id);
        let rejected = (qty - view.displayed - view.hidden).max(0.0);
        (Some(view), if rejected > EPS { rejected } else { 0.0 })
    }

    // ---- cancellation ------------------------------------------------------

    /// Remove one order. Unknown ids are a no-op returning `None`.
    pub fn cancel_order(&mut self, id: OrderId) -> Option<CanceledOrder> {
        let (side, key) = self.locator.remove(&id)?;
        let (order, dead, price) = {
            let ladder = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = ladder.get_mut(&key).expect("locator points at a missing level");
            let order = level.remove_order(id).expect("indexed order missing from its level");
            let dead = level.is_dead();
            let price = level.price;
            (order, dead, price)
        };
        if dead {
            match side {
                Side::Buy => self.bids.remove(&key),
                Side::Sell => self.asks.remove(&key),
            };
            self.events.push(BookEvent::LevelPruned { side, price });
        }
        if let Some(set) = self.owner_index.get_mut(&order.owner_id) {
            set.remove(&id);
            if set.is_empty() {
                self.owner_index.remove(&order.owner_id);
            }
        }
        Some(CanceledOrder {
            order_id: id,
            owner_id: order.owner_id,
            side,
            price: order.price,
            remaining: order.remaining,
            hidden: order.hidden_remaining,
        })
    }

    /// Remove every order the owner holds, in id order.
    pub fn cancel_all_for_owner(&mut self, owner_id: OwnerId) -> Vec<CanceledOrder> {
        let ids: Vec<OrderId> = self
            .owner_index
            .get(&owner_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        ids.into_iter().filter_map(|id| self.cancel_order(id)).collect()
    }

    fn unindex(&mut self, id: OrderId, owner_id: OwnerId) {
        self.locator.remove(&id);
        if let Some(set) = self.owner_index.get_mut(&owner_id) {
            set.remove(&id);
            if set.is_empty() {
                self.owner_index.remove(&owner_id);
            }
        }
    }

    // ---- maintenance -------------------------------------------------------

    /// Ages, decays and refreshes resting liquidity, regenerates ambient
    /// baseline around the (fair-value-nudged) mid, and appends one analytics
    /// snapshot.
    pub fn tick_maintenance(&mut self, center: f64, fair: f64, now_ms: u64) {
        self.now_ms = now_ms;
        self.age_resting_orders(Side::Buy);
        self.age_resting_orders(Side::Sell);
        self.regenerate_baseline(center, fair);
        self.push_snapshot();
        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    fn age_resting_orders(&mut self, side: Side) {
        let now = self.now_ms;
        let cfg = self.cfg.clone();
        let keys: Vec<PriceKey> = match side {
            Side::Buy => self.bids.keys().copied().collect(),
            Side::Sell => self.asks.keys().copied().collect(),
        };
        let mut expired: Vec<RestingOrder> = Vec::new();
        let mut pruned: Vec<(PriceKey, f64)> = Vec::new();

        for key in keys {
            let ladder = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let Some(level) = ladder.get_mut(&key) else { continue };

            // Decay + expiry.
            level.orders.retain_mut(|o| {
                let age = now.saturating_sub(o.created_at);
                if age > cfg.half_life_ms / 2 {
                    let exp = age as f64 / cfg.half_life_ms as f64;
                    o.remaining *= cfg.passive_decay.powf(exp);
                }
                let starved = o.remaining < cfg.expiry_threshold() && o.hidden_remaining <= EPS;
                if age > cfg.max_age_ms || starved {
                    expired.push(o.clone());
                    false
                } else {
                    true
                }
            });

            // Refresh due icebergs, re-queued at the back of time priority.
            let mut kept: VecDeque<RestingOrder> = VecDeque::with_capacity(level.orders.len());
            let mut requeued: Vec<RestingOrder> = Vec::new();
            while let Some(mut o) = level.orders.pop_front() {
                let due = o.hidden_remaining > EPS
                    && (o.remaining <= cfg.refresh_threshold() || now >= o.next_refresh_at);
                if due {
                    o.refresh_clip(&cfg, now);
                    self.events.push(BookEvent::Refreshed {
                        order_id: o.id,
                        owner_id: o.owner_id,
                        price: o.price,
                        displayed: o.remaining,
                    });
                    requeued.push(o);
                } else {
                    kept.push_back(o);
                }
            }
            kept.extend(requeued);
            level.orders = kept;

            if level.is_dead() {
                pruned.push((key, level.price));
            }
        }

        for o in expired {
            self.unindex(o.id, o.owner_id);
            debug!(order_id = o.id, owner_id = o.owner_id, price = o.price, "order expired");
            self.events.push(BookEvent::Expired {
                order_id: o.id,
                owner_id: o.owner_id,
                side: o.side,
                price: o.price,
                remaining: o.remaining,
            });
        }
        for (key, price) in pruned {
            match side {
                Side::Buy => self.bids.remove(&key),
                Side::Sell => self.asks.remove(&key),
            };
            self.events.push(BookEvent::LevelPruned { side, price });
        }
    }

    /// Move each targeted level's ambient volume a fraction of the way toward
    /// its distance-decayed target; discard baseline elsewhere.
    fn regenerate_baseline(&mut self, center: f64, fair: f64) {
        let cfg = self.cfg.clone();
        let anchor = center + cfg.fair_nudge * (fair - center);
        let mid_key = self.key_of(anchor);

        let mut targeted_bids: BTreeSet<PriceKey> = BTreeSet::new();
        let mut targeted_asks: BTreeSet<PriceKey> = BTreeSet::new();

        for i in 1..=cfg.levels_per_side as i64 {
            let target = (cfg.base_depth * (-cfg.depth_falloff * (i - 1) as f64).exp())
                .clamp(cfg.min_volume, cfg.max_volume)
                .round();
            for (side, key) in [(Side::Buy, mid_key - i), (Side::Sell, mid_key + i)] {
                if key < 1 {
                    continue;
                }
                let jitter = 1.0 + self.rng.gen_range(-cfg.base_jitter..=cfg.base_jitter);
                let target = target * jitter;
                let price = self.price_of(key);
                let ladder = match side {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                let level = ladder.entry(key).or_insert_with(|| PriceLevel::new(side, price));
                if level.base < target {
                    level.base += (target - level.base) * cfg.regen_rate;
                } else {
                    level.base -= (level.base - target) * cfg.excess_decay;
                }
                match side {
                    Side::Buy => targeted_bids.insert(key),
                    Side::Sell => targeted_asks.insert(key),
                };
            }
        }

        for (side, targeted) in [(Side::Buy, &targeted_bids), (Side::Sell, &targeted_asks)] {
            let ladder = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let stale: Vec<PriceKey> =
                ladder.keys().filter(|k| !targeted.contains(k)).copied().collect();
            for key in stale {
                let level = ladder.get_mut(&key).expect("key just listed");
                if level.orders.is_empty() {
                    ladder.remove(&key);
                    trace!(%side, key, "untargeted baseline level discarded");
                } else {
                    level.base -= level.base * self.cfg.excess_decay;
                    if level.base <= EPS {
                        level.base = 0.0;
                    }
                }
            }
        }
    }

    fn push_snapshot(&mut self) {
        let depth = self.cfg.levels_per_side as usize;
        let bid_depth: Vec<DepthEntry> = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(&k, l)| DepthEntry { price: self.price_of(k), volume: l.total_volume() })
            .collect();
        let ask_depth: Vec<DepthEntry> = self
            .asks
            .iter()
            .take(depth)
            .map(|(&k, l)| DepthEntry { price: self.price_of(k), volume: l.total_volume() })
            .collect();
        let best_bid = self.best_bid();
        let best_ask = self.best_ask();
        let spread = match (best_bid, best_ask) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        };
        self.snapshots.push(BookSnapshot {
            ts_ms: self.now_ms,
            best_bid,
            best_ask,
            spread,
            mid: self.mid(),
            last_trade: self.last_trade_price,
            bid_depth,
            ask_depth,
        });
    }

    // ---- views -------------------------------------------------------------

    pub fn top_of_book(&self, depth: usize) -> TopOfBook {
        let view = |l: &PriceLevel| LevelView {
            price: l.price,
            base: l.base,
            manual: l.manual_volume(),
            total: l.total_volume(),
            order_count: l.orders.len(),
        };
        let bids: Vec<LevelView> = self.bids.values().rev().take(depth).map(view).collect();
        let asks: Vec<LevelView> = self.asks.values().take(depth).map(view).collect();
        let spread = match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        };
        TopOfBook { bids, asks, spread, mid: self.mid() }
    }

    /// Owner of a resting order, if it exists.
    pub fn order_owner(&self, id: OrderId) -> Option<OwnerId> {
        let (side, key) = *self.locator.get(&id)?;
        let ladder = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let level = ladder.get(&key).expect("locator points at a missing level");
        let o = level
            .orders
            .iter()
            .find(|o| o.id == id)
            .expect("indexed order missing from its level");
        Some(o.owner_id)
    }

    pub fn orders_for_owner(&self, owner_id: OwnerId) -> Vec<RestingOrderView> {
        let Some(ids) = self.owner_index.get(&owner_id) else { return Vec::new() };
        ids.iter()
            .map(|id| {
                let (side, key) = self.locator[id];
                let ladder = match side {
                    Side::Buy => &self.bids,
                    Side::Sell => &self.asks,
                };
                let level = ladder.get(&key).expect("locator points at a missing level");
                let o = level
                    .orders
                    .iter()
                    .find(|o| o.id == *id)
                    .expect("indexed order missing from its level");
                RestingOrderView {
                    order_id: o.id,
                    owner_id: o.owner_id,
                    side: o.side,
                    price: o.price,
                    remaining_units: o.total_remaining().round() as i64,
                    displayed: o.remaining,
                    hidden: o.hidden_remaining,
                    created_at_ms: o.created_at,
                }
            })
            .collect()
    }

    /// Every order in the owner index exists in exactly one level list, and
    /// vice versa. An inconsistency is a programming error.
    pub fn assert_consistent(&self) {
        let mut seen = 0usize;
        for ladder in [&self.bids, &self.asks] {
            for (key, level) in ladder {
                for o in &level.orders {
                    seen += 1;
                    let loc = self.locator.get(&o.id).expect("order missing from locator");
                    assert_eq!(loc.1, *key, "locator key mismatch");
                    assert!(
                        self.owner_index
                            .get(&o.owner_id)
                            .is_some_and(|s| s.contains(&o.id)),
                        "order missing from owner index"
                    );
                }
            }
        }
        assert_eq!(seen, self.locator.len(), "locator holds orders not in any level");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(BookConfig::default()).unwrap()
    }

    fn seeded_book() -> OrderBook {
        let mut b = book();
        b.tick_maintenance(100.0, 100.0, 0);
        // Converge ambient toward target.
        for t in 1..=20 {
            b.tick_maintenance(100.0, 100.0, t * 250);
        }
        b
    }

    #[test]
    fn quantize_snaps_and_clamps() {
        let b = book();
        assert_eq!(b.quantize(100.26), 100.5);
        assert_eq!(b.quantize(100.24), 100.0);
        assert_eq!(b.quantize(0.01), 0.5); // floor-clamped to one tick
        assert_eq!(b.quantize(-3.0), 0.5);
    }

    #[test]
    fn fresh_book_is_empty_until_first_maintenance() {
        let mut b = book();
        assert_eq!(b.resting_order_count(), 0);
        assert_eq!(b.level_count(), 0);
        b.tick_maintenance(100.0, 100.0, 0);
        assert!(b.level_count() > 0);
        assert_eq!(b.resting_order_count(), 0);
    }

    #[test]
    fn baseline_regenerates_toward_target() {
        let mut b = book();
        b.tick_maintenance(100.0, 100.0, 0);
        let first = b.top_of_book(1).asks[0].total;
        for t in 1..=30 {
            b.tick_maintenance(100.0, 100.0, t * 250);
        }
        let settled = b.top_of_book(1).asks[0].total;
        assert!(settled > first, "ambient volume should build up over passes");
        let cfg = BookConfig::default();
        assert!(settled <= cfg.max_volume);
        assert!(settled >= cfg.min_volume);
    }

    #[test]
    fn zero_and_negative_qty_are_noops() {
        let mut b = seeded_book();
        let r = b.execute_market_order(Side::Buy, 0.0, None);
        assert_eq!(r.filled, 0.0);
        assert!(r.fills.is_empty());
        let r = b.execute_market_order(Side::Buy, -5.0, None);
        assert_eq!(r.filled, 0.0);
    }

    #[test]
    fn market_order_consumes_ambient_baseline() {
        let mut b = seeded_book();
        let r = b.execute_market_order(Side::Buy, 4.0, None);
        assert!((r.filled - 4.0).abs() < EPS);
        assert!(r.fills.iter().all(|f| f.owner_id.is_none()));
        assert!(r.avg_price.is_some());
        assert_eq!(b.last_trade_price(), Some(r.fills.last().unwrap().price));
    }

    #[test]
    fn manual_orders_match_before_baseline_in_arrival_order() {
        let mut b = seeded_book();
        let ask = b.best_ask().unwrap();
        let first = b.place_limit_order(11, Side::Sell, ask, 3.0);
        let second = b.place_limit_order(12, Side::Sell, ask, 3.0);
        let id1 = first.resting.unwrap().order_id;
        let id2 = second.resting.unwrap().order_id;

        let r = b.execute_market_order(Side::Buy, 4.0, None);
        assert!((r.filled - 4.0).abs() < EPS);
        // First fill drains the earlier order entirely, then the later one.
        assert_eq!(r.fills[0].order_id, Some(id1));
        assert!((r.fills[0].size - 3.0).abs() < EPS);
        assert_eq!(r.fills[1].order_id, Some(id2));
        assert!((r.fills[1].size - 1.0).abs() < EPS);
        assert_eq!(b.orders_for_owner(11).len(), 0);
        assert_eq!(b.orders_for_owner(12).len(), 1);
    }

    #[test]
    fn sweep_crosses_levels_and_prunes_the_first() {
        let mut b = seeded_book();
        let pre_ask = b.best_ask().unwrap();
        let first_level_total = b.top_of_book(1).asks[0].total;
        let r = b.execute_market_order(Side::Buy, first_level_total + 20.0, None);
        assert!(r.fills.len() > 1);
        assert!(r.levels_swept() > 1);
        let post_ask = b.best_ask().unwrap();
        assert!(post_ask > pre_ask, "best ask must move away from the sweep");
        // No volume remains at the pre-sweep level.
        assert!(b.top_of_book(8).asks.iter().all(|l| l.price > pre_ask));
    }

    #[test]
    fn limit_order_crosses_then_rests_remainder() {
        let mut b = seeded_book();
        let ask = b.best_ask().unwrap();
        let available = b.top_of_book(1).asks[0].total;
        let qty = available + 10.0;
        let r = b.place_limit_order(7, Side::Buy, ask, qty);
        assert!(r.match_result.filled > 0.0);
        let resting = r.resting.expect("remainder should rest");
        assert_eq!(resting.side, Side::Buy);
        assert_eq!(resting.price, ask);
        assert!(resting.displayed > 0.0);
        assert_eq!(b.orders_for_owner(7).len(), 1);
    }

    #[test]
    fn limit_order_respects_limit_price() {
        let mut b = seeded_book();
        let bid = b.best_bid().unwrap();
        // A buy below the best ask cannot cross; it rests untouched.
        let r = b.place_limit_order(7, Side::Buy, bid, 5.0);
        assert_eq!(r.match_result.filled, 0.0);
        assert!(r.resting.is_some());
    }

    #[test]
    fn level_capacity_rejects_rest() {
        let cfg = BookConfig { max_level_size: 20.0, ..Default::default() };
        let mut b = OrderBook::new(cfg).unwrap();
        let r1 = b.rest_order(1, Side::Sell, 105.0, 18.0);
        assert!(r1.0.is_some());
        // 2 lots of capacity remain; an 8-lot rest is clamped to it.
        let (view, rejected) = b.rest_order(2, Side::Sell, 105.0, 8.0);
        let view = view.expect("clamped rest");
        assert!((view.displayed + view.hidden - 2.0).abs() < EPS);
        assert!((rejected - 6.0).abs() < EPS);
        // Nothing left: rejected outright, book unchanged.
        let before = b.resting_order_count();
        let (none, rejected) = b.rest_order(3, Side::Sell, 105.0, 4.0);
        assert!(none.is_none());
        assert!((rejected - 4.0).abs() < EPS);
        assert_eq!(b.resting_order_count(), before);
    }

    #[test]
    fn iceberg_displays_only_a_clip_and_refreshes() {
        let mut b = book();
        let cfg = b.config().clone();
        let (view, _) = b.rest_order(5, Side::Sell, 105.0, 100.0);
        let view = view.unwrap();
        assert!(view.displayed < 100.0);
        assert!(view.hidden > 0.0);
        assert!(view.displayed >= cfg.min_clip);

        // Drain the clip; the forced refresh re-queues with a fresh clip.
        let r = b.execute_market_order(Side::Buy, view.displayed, Some(105.0));
        assert!((r.filled - view.displayed).abs() < EPS);
        let after = b.orders_for_owner(5);
        assert_eq!(after.len(), 1, "iceberg must survive a drained clip");
        assert!(after[0].displayed > 0.0);
        assert!(after[0].hidden < view.hidden);
        let events = b.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, BookEvent::Refreshed { order_id, .. } if *order_id == view.order_id)));
    }

    #[test]
    fn scheduled_refresh_requeues_at_back() {
        let cfg = BookConfig { refresh_interval_ms: 1_000, ..Default::default() };
        let mut b = OrderBook::new(cfg).unwrap();
        let (iceberg, _) = b.rest_order(1, Side::Sell, 200.0, 100.0);
        let iceberg = iceberg.unwrap();
        let (plain, _) = b.rest_order(2, Side::Sell, 200.0, 10.0);
        let plain = plain.unwrap();

        // Past the scheduled refresh: iceberg moves behind the plain order.
        // Maintenance centered on the order price keeps ambient off this level.
        b.tick_maintenance(200.0, 200.0, 1_500);
        let r = b.execute_market_order(Side::Buy, 5.0, Some(200.0));
        assert_eq!(r.fills[0].order_id, Some(plain.order_id));
        assert_ne!(r.fills[0].order_id, Some(iceberg.order_id));
    }

    #[test]
    fn aging_decays_and_expires_orders() {
        let cfg = BookConfig {
            half_life_ms: 10_000,
            max_age_ms: 60_000,
            levels_per_side: 2,
            ..Default::default()
        };
        let mut b = OrderBook::new(cfg).unwrap();
        let (view, _) = b.rest_order(1, Side::Sell, 200.0, 20.0);
        let view = view.unwrap();

        b.tick_maintenance(100.0, 100.0, 15_000);
        let aged = b.orders_for_owner(1);
        assert_eq!(aged.len(), 1);
        assert!(aged[0].displayed < view.displayed, "displayed remainder must decay");

        b.tick_maintenance(100.0, 100.0, 61_000);
        assert!(b.orders_for_owner(1).is_empty(), "order must expire past max age");
        let events = b.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, BookEvent::Expired { order_id, .. } if *order_id == view.order_id)));
    }

    #[test]
    fn cancel_removes_order_and_prunes_level() {
        let mut b = book();
        let (view, _) = b.rest_order(9, Side::Buy, 90.0, 5.0);
        let view = view.unwrap();
        let canceled = b.cancel_order(view.order_id).expect("order exists");
        assert_eq!(canceled.owner_id, 9);
        assert_eq!(canceled.side, Side::Buy);
        assert_eq!(b.resting_order_count(), 0);
        assert_eq!(b.level_count(), 0);
        // Unknown id is a no-op.
        assert!(b.cancel_order(view.order_id).is_none());
        assert!(b.cancel_order(99_999).is_none());
    }

    #[test]
    fn cancel_all_for_owner_only_touches_that_owner() {
        let mut b = book();
        b.rest_order(1, Side::Buy, 90.0, 5.0);
        b.rest_order(1, Side::Sell, 110.0, 5.0);
        b.rest_order(2, Side::Buy, 90.0, 5.0);
        let canceled = b.cancel_all_for_owner(1);
        assert_eq!(canceled.len(), 2);
        assert!(b.orders_for_owner(1).is_empty());
        assert_eq!(b.orders_for_owner(2).len(), 1);
        assert!(b.cancel_all_for_owner(42).is_empty());
    }

    #[test]
    fn maintenance_appends_bounded_snapshots() {
        let cfg = BookConfig { snapshot_capacity: 10, ..Default::default() };
        let mut b = OrderBook::new(cfg).unwrap();
        for t in 0..25u64 {
            b.tick_maintenance(100.0, 100.0, t * 250);
        }
        assert_eq!(b.snapshots().len(), 10);
        let latest = b.snapshots().latest().unwrap();
        assert_eq!(latest.ts_ms, 24 * 250);
        assert!(latest.best_bid.is_some());
        assert!(latest.best_ask.is_some());
        assert!(latest.spread.unwrap() > 0.0);
    }

    #[test]
    fn same_seed_same_book() {
        let run = || {
            let cfg = BookConfig { seed: 42, ..Default::default() };
            let mut b = OrderBook::new(cfg).unwrap();
            for t in 0..10u64 {
                b.tick_maintenance(100.0, 100.0, t * 250);
            }
            serde_json::to_string(&b.top_of_book(8)).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn indexes_stay_consistent_under_churn() {
        let mut b = seeded_book();
        let ask = b.best_ask().unwrap();
        for i in 0..10u64 {
            b.place_limit_order(i % 3, Side::Sell, ask + (i % 4) as f64, 10.0 + i as f64);
        }
        b.execute_market_order(Side::Buy, 60.0, None);
        b.cancel_all_for_owner(1);
        b.tick_maintenance(100.0, 100.0, b.now_ms() + 250);
        b.assert_consistent();
    }
}
