//! Service state management and component wiring

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use market_engine::{EngineEvent, MarketEngine, PlayerId};
use sim_clock::SimClock;

use crate::config::ServiceConfig;

/// Service state containing all initialized components.
pub struct ServiceState {
    pub config: ServiceConfig,
    pub engine: Arc<Mutex<MarketEngine>>,
    pub clock: Arc<SimClock>,
    pub player_ids: Vec<PlayerId>,
}

impl ServiceState {
    /// Build the engine, register configured players and wire the clock.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing market engine...");
        let mut engine = MarketEngine::new(config.engine.clone(), config.book.clone())
            .context("failed to construct MarketEngine")?;

        let mut player_ids = Vec::with_capacity(config.players.names.len());
        for name in &config.players.names {
            let player = engine.register_player(name.clone());
            info!(id = player.id, name = %player.name, "registered player");
            player_ids.push(player.id);
        }

        let engine = Arc::new(Mutex::new(engine));
        let clock = Arc::new(SimClock::new(Arc::clone(&engine), config.clock.clone()));

        Ok(Self { config, engine, clock, player_ids })
    }

    /// Run the tick loop until stopped.
    pub async fn run_clock(&self) -> Result<()> {
        self.clock.run_clock_loop().await.context("clock loop failed")?;
        Ok(())
    }

    /// Drain outbound engine events and surface them on the log. This is the
    /// transport boundary: a real gateway would broadcast these instead.
    pub async fn run_event_pump(&self) -> Result<()> {
        let cadence = self.config.clock.tick_cadence();
        let mut clock_seen_running = false;
        loop {
            tokio::time::sleep(cadence).await;
            let events = {
                let mut engine = self.engine.lock();
                engine.drain_events(4_096)
            };
            for event in &events {
                match event {
                    EngineEvent::Fill { price, size, taker_id, maker_id, .. } => {
                        info!(price, size, taker_id, ?maker_id, "fill");
                    }
                    EngineEvent::News { delta, text, .. } => {
                        info!(delta, %text, "news");
                    }
                    EngineEvent::OrderExpired { owner_id, order_id, .. } => {
                        debug!(owner_id, order_id, "order expired");
                    }
                    EngineEvent::OrderCanceled { owner_id, order_id, .. } => {
                        debug!(owner_id, order_id, "order canceled");
                    }
                    EngineEvent::TickComplete { .. } => {}
                }
            }
            if self.clock.is_running() {
                clock_seen_running = true;
            } else if clock_seen_running && events.is_empty() {
                return Ok(());
            }
        }
    }

    /// Resolve once the clock has started and then stopped (bounded runs).
    pub async fn clock_done(&self) {
        let mut seen_running = false;
        loop {
            if self.clock.is_running() {
                seen_running = true;
            } else if seen_running {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    /// Stop the clock; the loop exits after the tick in flight.
    pub fn shutdown(&self) {
        info!("stopping clock");
        self.clock.stop();
    }
}
