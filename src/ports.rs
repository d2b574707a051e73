//! External collaborator contracts (spec §6). Everything outside the hard
//! core — HTTP surface, real broker/network integrations, a real market-data
//! feed — is modelled only as a trait here.

use crate::dividend::{Dividend, DividendReceivable};
use crate::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
use crate::domain::ids::{DividendId, OrderId, PositionId, PortfolioId, ReceivableId, TenantId, TradeId};
use crate::domain::quote::{MarketQuote, QuoteSource};
use crate::errors::EngineResult;
use crate::event::Event;
use crate::order::Order;
use crate::position::Position;
use crate::timeline::TimelineRow;
use crate::trade::Trade;
use crate::types::EngineDateTime;

#[derive(Clone, Copy, Debug)]
pub struct OhlcvBar {
    pub timestamp: EngineDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Pluggable quote source (spec §6). Production orchestrators reject any
/// response not tagged `Live` or `Historical`.
pub trait MarketDataProvider {
    fn get_latest_quote(&self, ticker: &str) -> EngineResult<MarketQuote>;
    fn get_historical_bars(
        &self,
        ticker: &str,
        start: EngineDateTime,
        end: EngineDateTime,
    ) -> EngineResult<Vec<OhlcvBar>>;
    fn get_dividends(
        &self,
        ticker: &str,
        start: EngineDateTime,
        end: EngineDateTime,
    ) -> EngineResult<Vec<Dividend>>;
    fn source(&self) -> QuoteSource;
}

pub struct FillResult {
    pub qty: f64,
    pub price: f64,
    pub commission: f64,
    pub executed_at: EngineDateTime,
}

/// `submit` returns a broker reference (live) or a synchronous fill
/// (simulation); grounded on the comment in `src/broker/types.rs` that the
/// current execution model fills instantaneously.
pub trait BrokerAdapter {
    fn submit(&self, order: &Order, price: f64) -> EngineResult<FillResult>;
}

pub trait ConfigStore {
    fn get_commission_rate(&self, tenant: &TenantId, asset: &str) -> f64;
    fn get_trigger_config(
        &self,
        tenant: &TenantId,
        portfolio: &PortfolioId,
        position: &PositionId,
    ) -> TriggerConfig;
    fn get_guardrail_config(
        &self,
        tenant: &TenantId,
        portfolio: &PortfolioId,
        position: &PositionId,
    ) -> GuardrailConfig;
    fn get_order_policy(
        &self,
        tenant: &TenantId,
        portfolio: &PortfolioId,
        position: &PositionId,
    ) -> OrderPolicy;
}

pub trait PositionRepository {
    fn get(&self, position_id: &PositionId) -> EngineResult<Position>;
    fn save(&self, position: Position) -> EngineResult<()>;
}

pub trait OrderRepository {
    fn get(&self, order_id: &OrderId) -> EngineResult<Order>;
    fn save(&self, order: Order) -> EngineResult<()>;
    fn find_by_idempotency_key(
        &self,
        position_id: &PositionId,
        key: &str,
    ) -> EngineResult<Option<Order>>;
    fn orders_today(&self, position_id: &PositionId, today: EngineDateTime) -> EngineResult<u32>;
}

pub trait TradeRepository {
    fn save(&self, trade: Trade) -> EngineResult<()>;
    fn list_for_position(&self, position_id: &PositionId) -> EngineResult<Vec<Trade>>;
}

pub trait EventRepository {
    fn append(&self, event: Event) -> EngineResult<()>;
    fn list_for_position(&self, position_id: &PositionId) -> EngineResult<Vec<Event>>;
}

pub trait TimelineRepository {
    fn append(&self, row: TimelineRow) -> EngineResult<()>;
}

pub trait DividendRepository {
    fn save(&self, dividend: Dividend) -> EngineResult<()>;
    fn get(&self, dividend_id: &DividendId) -> EngineResult<Dividend>;
}

pub trait DividendReceivableRepository {
    fn save(&self, receivable: DividendReceivable) -> EngineResult<()>;
    fn get(&self, receivable_id: &ReceivableId) -> EngineResult<DividendReceivable>;
}

/// Requires atomic compare-and-set on `(position_id, idempotency_key)`.
pub trait IdempotencyStore {
    fn check_and_reserve(
        &self,
        position_id: &PositionId,
        key: &str,
        signature: &str,
    ) -> EngineResult<IdempotencyOutcome>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdempotencyOutcome {
    Reserved,
    ExistingMatch,
    SignatureMismatch,
}
