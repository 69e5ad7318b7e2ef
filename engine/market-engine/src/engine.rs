//! The market engine: player registry, accounting, trade tape, news and the
//! price process, with all matching delegated to the order book.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use order_book::{
    BookConfig, BookEvent, CanceledOrder, OrderBook, OrderId, RestingOrderView, Side, TopOfBook,
    EPS,
};

use crate::config::{EngineConfig, PriceMode};
use crate::error::EngineError;
use crate::events::{EngineEvent, OutboundQueue, OverflowPolicy};
use crate::news::{self, NewsEvent, NewsLog};
use crate::player::{Player, PlayerId};
use crate::price::PriceProcess;
use crate::tape::{TradeRecord, TradeTape};

/// Order intent as submitted by bots and players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub kind: OrderKind,
    pub side: Side,
    /// Required for limit orders, ignored for market orders.
    pub price: Option<f64>,
    /// Fractional requests are silently rounded to whole lots.
    pub quantity: f64,
}

impl OrderSpec {
    pub fn market(side: Side, quantity: f64) -> Self {
        Self { kind: OrderKind::Market, side, price: None, quantity }
    }

    pub fn limit(side: Side, price: f64, quantity: f64) -> Self {
        Self { kind: OrderKind::Limit, side, price: Some(price), quantity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit,
}

/// Why an order was not applied. Rejections are results, not exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownOwner,
    NonPositiveQuantity,
    MissingPrice,
    PositionCap,
    LevelCapacity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillView {
    pub price: f64,
    pub size: i64,
    pub maker_id: Option<PlayerId>,
    pub maker_order_id: Option<OrderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub ok: bool,
    pub reason: Option<RejectReason>,
    /// Whole lots actually applied to the ledger.
    pub filled: i64,
    pub avg_price: Option<f64>,
    pub fills: Vec<FillView>,
    pub resting: Option<RestingOrderView>,
}

impl OrderResponse {
    fn reject(reason: RejectReason) -> Self {
        Self { ok: false, reason: Some(reason), filled: 0, avg_price: None, fills: Vec::new(), resting: None }
    }
}

/// Aggregate depth view handed to transports. Deep-copied; mutating it cannot
/// touch engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookView {
    pub ts_ms: u64,
    pub book: TopOfBook,
    pub last_trade_price: Option<f64>,
}

/// Per-tick snapshot broadcast outward by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub ts_ms: u64,
    pub price: f64,
    pub fair: f64,
    pub fair_target: f64,
    pub mode: PriceMode,
    pub last_sweep_pressure: f64,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub spread: Option<f64>,
    pub last_trade_price: Option<f64>,
    pub players: Vec<Player>,
}

pub struct MarketEngine {
    cfg: EngineConfig,
    mode: PriceMode,
    book: OrderBook,
    players: HashMap<PlayerId, Player>,
    next_player_id: PlayerId,
    tape: TradeTape,
    news: NewsLog,
    outbound: OutboundQueue,
    process: PriceProcess,
    rng: StdRng,
    tick: u64,
    now_ms: u64,
}

impl MarketEngine {
    pub fn new(cfg: EngineConfig, book_cfg: BookConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        let book = OrderBook::new(book_cfg)?;
        let process = PriceProcess::new(&cfg);
        let outbound = OutboundQueue::new(cfg.event_queue_capacity, OverflowPolicy::DropOldest);
        let tape = TradeTape::new(cfg.tape_capacity);
        let news = NewsLog::new(cfg.news_capacity);
        // Offset so headline choice doesn't mirror the price-noise stream.
        let rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(0x9E37));
        let mode = cfg.mode;
        Ok(Self {
            cfg,
            mode,
            book,
            players: HashMap::new(),
            next_player_id: 1,
            tape,
            news,
            outbound,
            process,
            rng,
            tick: 0,
            now_ms: 0,
        })
    }

    // ---- registry ----------------------------------------------------------

    pub fn register_player(&mut self, name: impl Into<String>) -> Player {
        let id = self.next_player_id;
        self.next_player_id += 1;
        let player = Player::new(id, name);
        debug!(id, name = %player.name, "player registered");
        self.players.insert(id, player.clone());
        player
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    // ---- trading API -------------------------------------------------------

    /// Validate, cross/rest via the book, and translate raw fills into trades
    /// and account mutations. Validation happens before any book or account
    /// state changes.
    pub fn submit_order(&mut self, owner_id: PlayerId, spec: OrderSpec) -> OrderResponse {
        if !self.players.contains_key(&owner_id) {
            return OrderResponse::reject(RejectReason::UnknownOwner);
        }
        let qty = spec.quantity.round();
        if qty < 1.0 {
            return OrderResponse::reject(RejectReason::NonPositiveQuantity);
        }
        let qty_units = qty as i64;

        // Position cap, counting standing same-side exposure so maker fills
        // can never push a player past the cap later.
        let position = self.players[&owner_id].position;
        let exposure = self.open_exposure(owner_id, spec.side);
        let projected = match spec.side {
            Side::Buy => position + qty_units + exposure,
            Side::Sell => position - qty_units - exposure,
        };
        if projected.abs() > self.cfg.max_position {
            debug!(owner_id, projected, cap = self.cfg.max_position, "order rejected: position cap");
            return OrderResponse::reject(RejectReason::PositionCap);
        }

        let (result, resting, rest_rejected) = match spec.kind {
            OrderKind::Market => {
                let r = self.book.execute_market_order(spec.side, qty, None);
                // A remainder with no opposing liquidity rests at the current
                // quantized price.
                let mut resting = None;
                if r.remainder.round() >= 1.0 {
                    let price = self.book.quantize(self.process.price());
                    let (view, _) = self.book.rest_order(owner_id, spec.side, price, r.remainder);
                    resting = view;
                }
                (r, resting, 0.0)
            }
            OrderKind::Limit => {
                let Some(price) = spec.price else {
                    return OrderResponse::reject(RejectReason::MissingPrice);
                };
                let placed = self.book.place_limit_order(owner_id, spec.side, price, qty);
                (placed.match_result, placed.resting, placed.rejected_remainder)
            }
        };

        // Quantity discipline: every fill size is rounded to whole lots
        // before touching the tape or any account.
        let mut fills = Vec::with_capacity(result.fills.len());
        let mut filled_units = 0i64;
        let mut notional = 0.0;
        for fill in &result.fills {
            let size = fill.size.round() as i64;
            if size == 0 {
                continue;
            }
            self.apply_fill_to(owner_id, spec.side, size, fill.price);
            if let Some(maker) = fill.owner_id {
                self.apply_fill_to(maker, spec.side.opposite(), size, fill.price);
            }
            self.tape.push(TradeRecord {
                ts_ms: self.now_ms,
                price: fill.price,
                size,
                taker_side: spec.side,
                taker_id: owner_id,
                maker_id: fill.owner_id,
            });
            self.outbound.push(EngineEvent::Fill {
                ts_ms: self.now_ms,
                price: fill.price,
                size,
                taker_side: spec.side,
                taker_id: owner_id,
                maker_id: fill.owner_id,
                maker_order_id: fill.order_id,
            });
            fills.push(FillView {
                price: fill.price,
                size,
                maker_id: fill.owner_id,
                maker_order_id: fill.order_id,
            });
            filled_units += size;
            notional += size as f64 * fill.price;
        }

        if filled_units > 0 && result.levels_swept() >= self.cfg.sweep.min_levels {
            self.process.record_sweep(spec.side, filled_units as f64, &self.cfg.sweep);
            trace!(owner_id, filled_units, side = %spec.side, "sweep registered");
        }

        let ok = filled_units > 0 || resting.is_some();
        let reason = if !ok && rest_rejected > EPS { Some(RejectReason::LevelCapacity) } else { None };
        let avg_price =
            if filled_units > 0 { Some(notional / filled_units as f64) } else { None };
        OrderResponse { ok, reason, filled: filled_units, avg_price, fills, resting }
    }

    /// Cancel the given orders (all of the owner's when `ids` is `None`).
    /// Orders the owner does not hold are skipped, never an error.
    pub fn cancel_orders(
        &mut self,
        owner_id: PlayerId,
        ids: Option<&[OrderId]>,
    ) -> Vec<CanceledOrder> {
        let canceled: Vec<CanceledOrder> = match ids {
            None => self.book.cancel_all_for_owner(owner_id),
            Some(ids) => {
                let owned: Vec<OrderId> = ids
                    .iter()
                    .copied()
                    .filter(|id| self.book.order_owner(*id) == Some(owner_id))
                    .collect();
                owned.into_iter().filter_map(|id| self.book.cancel_order(id)).collect()
            }
        };
        for c in &canceled {
            self.outbound.push(EngineEvent::OrderCanceled {
                ts_ms: self.now_ms,
                owner_id: c.owner_id,
                order_id: c.order_id,
                side: c.side,
                price: c.price,
                remaining: c.remaining + c.hidden,
            });
        }
        canceled
    }

    pub fn get_player_orders(&self, owner_id: PlayerId) -> Vec<RestingOrderView> {
        self.book.orders_for_owner(owner_id)
    }

    pub fn get_top_of_book(&self, depth: usize) -> TopOfBook {
        self.book.top_of_book(depth)
    }

    pub fn get_order_book_view(&self, depth: usize) -> OrderBookView {
        OrderBookView {
            ts_ms: self.now_ms,
            book: self.book.top_of_book(depth),
            last_trade_price: self.book.last_trade_price(),
        }
    }

    pub fn get_recent_trades(&self, window_ms: u64) -> Vec<TradeRecord> {
        self.tape.recent(self.now_ms, window_ms)
    }

    pub fn get_news_events(&self, lookback_ms: u64) -> Vec<NewsEvent> {
        self.news.recent(self.now_ms, lookback_ms)
    }

    /// Nudge the fair-value target. The value itself only moves tick by tick.
    pub fn push_news(&mut self, delta: f64) -> NewsEvent {
        self.process.push_news(delta);
        let sign = if delta > 0.0 {
            1
        } else if delta < 0.0 {
            -1
        } else {
            0
        };
        let event = NewsEvent {
            ts_ms: self.now_ms,
            delta,
            sign,
            text: news::headline_for(delta, &mut self.rng),
        };
        self.news.push(event.clone());
        self.outbound.push(EngineEvent::News {
            ts_ms: event.ts_ms,
            delta,
            text: event.text.clone(),
        });
        event
    }

    pub fn set_price_mode(&mut self, mode: PriceMode) {
        self.mode = mode;
    }

    pub fn price_mode(&self) -> PriceMode {
        self.mode
    }

    // ---- tick driver contract ----------------------------------------------

    /// One simulation step: book maintenance, price/fair recompute, PnL mark.
    /// Must be called at a steady cadence for the time-based decay constants
    /// to behave as configured.
    pub fn step_tick(&mut self) -> TickSnapshot {
        self.tick += 1;
        self.now_ms += self.cfg.tick_interval_ms;

        let center = self.process.price();
        let fair = self.process.fair();
        self.book.tick_maintenance(center, fair, self.now_ms);
        for ev in self.book.drain_events() {
            if let BookEvent::Expired { order_id, owner_id, side, price, remaining } = ev {
                self.outbound.push(EngineEvent::OrderExpired {
                    ts_ms: self.now_ms,
                    owner_id,
                    order_id,
                    side,
                    price,
                    remaining,
                });
            }
        }

        let floor = self.book.config().tick_size;
        self.process.step(&self.cfg, self.mode, self.book.last_trade_price(), floor);

        let price = self.process.price();
        for p in self.players.values_mut() {
            p.mark(price);
            if p.position.abs() > self.cfg.max_position {
                warn!(player = p.id, position = p.position, "position exceeds cap");
            }
        }

        self.outbound.push(EngineEvent::TickComplete {
            tick: self.tick,
            ts_ms: self.now_ms,
            price,
            fair: self.process.fair(),
            mode: self.mode,
        });
        self.get_snapshot()
    }

    pub fn get_snapshot(&self) -> TickSnapshot {
        let top = self.book.top_of_book(1);
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        TickSnapshot {
            tick: self.tick,
            ts_ms: self.now_ms,
            price: self.process.price(),
            fair: self.process.fair(),
            fair_target: self.process.fair_target(),
            mode: self.mode,
            last_sweep_pressure: self.process.sweep_pressure(),
            best_bid: top.bids.first().map(|l| l.price),
            best_ask: top.asks.first().map(|l| l.price),
            spread: top.spread,
            last_trade_price: self.book.last_trade_price(),
            players,
        }
    }

    /// Dequeue up to `max_events` outbound events for transports/bots.
    pub fn drain_events(&mut self, max_events: usize) -> Vec<EngineEvent> {
        self.outbound.drain(max_events)
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    // ---- internals ---------------------------------------------------------

    fn apply_fill_to(&mut self, player_id: PlayerId, side: Side, size: i64, price: f64) {
        let Some(player) = self.players.get_mut(&player_id) else {
            // Ambient fills carry no owner; a known-id miss is a logic error.
            panic!("fill for unregistered player {player_id}");
        };
        player.apply_fill(side, size, price);
    }

    /// Standing displayed+hidden lots the owner has resting on `side`.
    fn open_exposure(&self, owner_id: PlayerId, side: Side) -> i64 {
        self.book
            .orders_for_owner(owner_id)
            .iter()
            .filter(|o| o.side == side)
            .map(|o| o.remaining_units)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_cfg() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.news_mode.noise_sigma_frac = 0.0;
        cfg.seed = 1;
        cfg
    }

    fn engine() -> MarketEngine {
        MarketEngine::new(quiet_cfg(), BookConfig { seed: 1, ..Default::default() }).unwrap()
    }

    /// Engine with ambient liquidity built up around the start price.
    fn seeded_engine() -> MarketEngine {
        let mut e = engine();
        for _ in 0..20 {
            e.step_tick();
        }
        e
    }

    #[test]
    fn orderflow_price_is_constant_without_trades() {
        let mut e = engine();
        let start = e.get_snapshot().price;
        for _ in 0..50 {
            let snap = e.step_tick();
            assert_eq!(snap.price, start);
        }
    }

    #[test]
    fn fresh_round_has_no_orders_or_levels_until_first_tick() {
        let mut e = engine();
        let top = e.get_top_of_book(8);
        assert!(top.bids.is_empty());
        assert!(top.asks.is_empty());
        e.step_tick();
        let top = e.get_top_of_book(8);
        assert!(!top.bids.is_empty());
        assert!(!top.asks.is_empty());
    }

    #[test]
    fn limit_sell_then_market_buy_produces_buy_trades_totalling_four() {
        let mut e = seeded_engine();
        let seller = e.register_player("seller").id;
        let buyer = e.register_player("buyer").id;

        let mid = e.get_top_of_book(1).mid.unwrap();
        let r = e.submit_order(seller, OrderSpec::limit(Side::Sell, mid + 1.0, 4.0));
        assert!(r.ok);

        let r = e.submit_order(buyer, OrderSpec::market(Side::Buy, 4.0));
        assert!(r.ok);
        assert_eq!(r.filled, 4);

        let trades = e.get_recent_trades(60_000);
        assert!(!trades.is_empty());
        assert!(trades.iter().all(|t| t.taker_side == Side::Buy));
        assert_eq!(trades.iter().map(|t| t.size).sum::<i64>(), 4);
    }

    #[test]
    fn quantities_are_rounded_to_whole_lots() {
        let mut e = seeded_engine();
        let p = e.register_player("frac").id;

        let r = e.submit_order(p, OrderSpec::market(Side::Buy, 3.4));
        assert!(r.ok);
        assert_eq!(r.filled, 3);
        assert!(e.get_recent_trades(60_000).iter().all(|t| t.size > 0));
        assert_eq!(e.player(p).unwrap().position, 3);

        // Rounds to zero: silently rejected as non-positive.
        let r = e.submit_order(p, OrderSpec::market(Side::Buy, 0.4));
        assert!(!r.ok);
        assert_eq!(r.reason, Some(RejectReason::NonPositiveQuantity));
    }

    #[test]
    fn market_remainder_rests_and_is_fully_consumed() {
        let mut e = engine(); // no ticks: book is empty
        let p1 = e.register_player("resting").id;
        let p2 = e.register_player("crossing").id;

        let r = e.submit_order(p1, OrderSpec::market(Side::Buy, 2.0));
        assert!(r.ok);
        assert_eq!(r.filled, 0);
        let resting = r.resting.expect("remainder must rest");
        assert_eq!(resting.remaining_units, 2);

        let r = e.submit_order(p2, OrderSpec::market(Side::Sell, 2.0));
        assert!(r.ok);
        assert_eq!(r.filled, 2);
        assert!(e.get_player_orders(p1).is_empty());
        assert_eq!(e.player(p1).unwrap().position, 2);
        assert_eq!(e.player(p2).unwrap().position, -2);
    }

    #[test]
    fn oversized_market_order_sweeps_levels() {
        let mut e = seeded_engine();
        let p = e.register_player("sweeper").id;
        let pre = e.get_top_of_book(1);
        let pre_ask = pre.asks[0].price;
        let first_level = pre.asks[0].total;

        let r = e.submit_order(p, OrderSpec::market(Side::Buy, first_level + 20.0));
        assert!(r.ok);
        assert!(r.fills.len() > 1);
        let post = e.get_top_of_book(8);
        assert!(post.asks[0].price > pre_ask);
        assert!(post.asks.iter().all(|l| l.price > pre_ask));
        assert!(e.get_snapshot().last_sweep_pressure > 0.0);
    }

    #[test]
    fn sweep_pressure_moves_news_mode_price_in_sweep_direction() {
        let mut e = seeded_engine();
        e.set_price_mode(PriceMode::News);
        let p = e.register_player("sweeper").id;
        let first_level = e.get_top_of_book(1).asks[0].total;

        e.submit_order(p, OrderSpec::market(Side::Buy, first_level + 30.0));
        let snap = e.get_snapshot();
        assert!(snap.last_sweep_pressure > 0.0);

        let before = snap.price;
        let after = e.step_tick().price;
        assert!(after > before, "news-mode price must move in the sweep direction");
    }

    #[test]
    fn rejections_are_structured_and_mutation_free() {
        let mut e = seeded_engine();
        let p = e.register_player("bounded").id;

        let r = e.submit_order(999, OrderSpec::market(Side::Buy, 1.0));
        assert!(!r.ok);
        assert_eq!(r.reason, Some(RejectReason::UnknownOwner));

        let r = e.submit_order(p, OrderSpec::limit(Side::Buy, 99.0, -3.0));
        assert_eq!(r.reason, Some(RejectReason::NonPositiveQuantity));

        let r = e.submit_order(p, OrderSpec { kind: OrderKind::Limit, side: Side::Buy, price: None, quantity: 5.0 });
        assert_eq!(r.reason, Some(RejectReason::MissingPrice));

        let cap = quiet_cfg().max_position;
        let r = e.submit_order(p, OrderSpec::market(Side::Buy, (cap + 1) as f64));
        assert!(!r.ok);
        assert_eq!(r.reason, Some(RejectReason::PositionCap));
        assert_eq!(e.player(p).unwrap().position, 0, "rejection must not mutate state");
        assert!(e.get_recent_trades(60_000).is_empty());
    }

    #[test]
    fn position_cap_counts_standing_exposure() {
        let mut e = seeded_engine();
        let p = e.register_player("capped").id;
        let cap = quiet_cfg().max_position;
        let mid = e.get_top_of_book(1).mid.unwrap();

        // Rest far above the market so nothing fills.
        let r = e.submit_order(p, OrderSpec::limit(Side::Buy, mid - 10.0, cap as f64));
        assert!(r.ok);
        let r = e.submit_order(p, OrderSpec::market(Side::Buy, 1.0));
        assert_eq!(r.reason, Some(RejectReason::PositionCap));
    }

    #[test]
    fn maker_and_taker_accounts_both_update() {
        let mut e = seeded_engine();
        let maker = e.register_player("maker").id;
        let taker = e.register_player("taker").id;

        // Rest inside the spread so the maker is first in line.
        let top = e.get_top_of_book(1);
        let inside = (top.bids[0].price + top.asks[0].price) / 2.0;
        let r = e.submit_order(maker, OrderSpec::limit(Side::Sell, inside, 4.0));
        assert!(r.ok);
        assert!(r.resting.is_some());

        let r = e.submit_order(taker, OrderSpec::market(Side::Buy, 4.0));
        assert!(r.ok);
        assert_eq!(r.filled, 4);
        assert_eq!(r.fills[0].maker_id, Some(maker));

        assert_eq!(e.player(maker).unwrap().position, -4);
        assert_eq!(e.player(taker).unwrap().position, 4);
        let trades = e.get_recent_trades(60_000);
        assert_eq!(trades.last().unwrap().maker_id, Some(maker));
    }

    #[test]
    fn pnl_is_recomputed_from_price_each_tick() {
        let mut e = seeded_engine();
        let p = e.register_player("pnl").id;
        let r = e.submit_order(p, OrderSpec::market(Side::Buy, 5.0));
        assert_eq!(r.filled, 5);
        let avg = r.avg_price.unwrap();

        let snap = e.step_tick();
        let me = snap.players.iter().find(|x| x.id == p).unwrap();
        let expected = (snap.price - avg) * 5.0 + me.realized;
        assert!((me.pnl - expected).abs() < 1e-9);
    }

    #[test]
    fn cancel_orders_filters_ownership() {
        let mut e = seeded_engine();
        let p1 = e.register_player("one").id;
        let p2 = e.register_player("two").id;
        let mid = e.get_top_of_book(1).mid.unwrap();

        let r1 = e.submit_order(p1, OrderSpec::limit(Side::Buy, mid - 5.0, 3.0));
        let id1 = r1.resting.unwrap().order_id;
        let r2 = e.submit_order(p2, OrderSpec::limit(Side::Buy, mid - 5.0, 3.0));
        let id2 = r2.resting.unwrap().order_id;

        // p1 cannot cancel p2's order.
        let canceled = e.cancel_orders(p1, Some(&[id1, id2]));
        assert_eq!(canceled.len(), 1);
        assert_eq!(canceled[0].order_id, id1);
        assert_eq!(e.get_player_orders(p2).len(), 1);

        // cancel-all for an owner with nothing resting is a no-op.
        assert!(e.cancel_orders(p1, None).is_empty());
        let canceled = e.cancel_orders(p2, None);
        assert_eq!(canceled.len(), 1);
        assert_eq!(canceled[0].order_id, id2);
    }

    #[test]
    fn news_push_adjusts_target_and_logs_event() {
        let mut e = engine();
        let ev = e.push_news(2.5);
        assert_eq!(ev.sign, 1);
        assert!(!ev.text.is_empty());
        let snap = e.get_snapshot();
        assert_eq!(snap.fair_target, 102.5);
        assert_eq!(snap.fair, 100.0, "fair moves tick by tick, not on push");

        let events = e.get_news_events(60_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].delta, 2.5);
    }

    #[test]
    fn outbound_queue_carries_fills_and_tick_completes() {
        let mut e = seeded_engine();
        e.drain_events(usize::MAX);
        let p = e.register_player("watcher").id;
        e.submit_order(p, OrderSpec::market(Side::Buy, 2.0));
        e.step_tick();

        let events = e.drain_events(usize::MAX);
        assert!(events.iter().any(|ev| matches!(ev, EngineEvent::Fill { taker_id, .. } if *taker_id == p)));
        assert!(events.iter().any(|ev| matches!(ev, EngineEvent::TickComplete { .. })));
        assert!(e.drain_events(10).is_empty());
    }

    #[test]
    fn snapshots_are_deterministic_for_a_seed() {
        let run = || {
            let mut e = MarketEngine::new(
                EngineConfig { seed: 9, mode: PriceMode::News, ..Default::default() },
                BookConfig { seed: 9, ..Default::default() },
            )
            .unwrap();
            let p = e.register_player("bot").id;
            e.push_news(3.0);
            for _ in 0..10 {
                e.step_tick();
            }
            e.submit_order(p, OrderSpec::market(Side::Buy, 10.0));
            let s = e.step_tick();
            format!(
                "{:?} {:?} {:?} {:?} {:?} {:?}",
                s.price, s.fair, s.last_sweep_pressure, s.best_bid, s.best_ask, s.last_trade_price
            )
        };
        assert_eq!(run(), run());
    }
}
