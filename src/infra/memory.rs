//! In-memory repository implementations. Two independent sets are
//! instantiated — one for live mode, a fresh one per `SimulationRun` — so
//! the simulation path can never observe live rows at the type level (spec
//! §4.12's read-isolation requirement), matching the
//! `HashMap<i64, HashMap<String, PenelopeQuote>>` store shape in
//! `src/input/penelope.rs`.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::dividend::{Dividend, DividendReceivable};
use crate::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
use crate::domain::ids::{DividendId, OrderId, PositionId, PortfolioId, ReceivableId, TenantId, TradeId};
use crate::errors::{EngineError, EngineResult};
use crate::event::Event;
use crate::order::Order;
use crate::ports::{
    ConfigStore, DividendReceivableRepository, DividendRepository, EventRepository,
    IdempotencyOutcome, IdempotencyStore, OrderRepository, PositionRepository, TimelineRepository,
    TradeRepository,
};
use crate::position::Position;
use crate::timeline::TimelineRow;
use crate::trade::Trade;
use crate::types::EngineDateTime;

#[derive(Default)]
pub struct InMemoryPositionRepository {
    rows: Mutex<HashMap<String, Position>>,
}

impl InMemoryPositionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, position: Position) {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(position.position_id.to_string(), position);
    }
}

impl PositionRepository for InMemoryPositionRepository {
    fn get(&self, position_id: &PositionId) -> EngineResult<Position> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .get(position_id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::PositionNotFound(position_id.to_string()))
    }

    fn save(&self, position: Position) -> EngineResult<()> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(position.position_id.to_string(), position);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    rows: Mutex<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn get(&self, order_id: &OrderId) -> EngineResult<Order> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .get(order_id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))
    }

    fn save(&self, order: Order) -> EngineResult<()> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(order.order_id.to_string(), order);
        Ok(())
    }

    fn find_by_idempotency_key(
        &self,
        position_id: &PositionId,
        key: &str,
    ) -> EngineResult<Option<Order>> {
        Ok(self
            .rows
            .lock()
            .expect("lock poisoned")
            .values()
            .find(|o| o.position_id.as_str() == position_id.as_str() && o.idempotency_key == key)
            .cloned())
    }

    fn orders_today(&self, position_id: &PositionId, today: EngineDateTime) -> EngineResult<u32> {
        let day_start = today.epoch_secs() - today.epoch_secs().rem_euclid(86_400);
        let day_end = day_start + 86_400;
        let count = self
            .rows
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|o| {
                o.position_id.as_str() == position_id.as_str()
                    && o.status == crate::order::OrderStatus::Filled
                    && o.created_at.epoch_secs() >= day_start
                    && o.created_at.epoch_secs() < day_end
            })
            .count();
        Ok(count as u32)
    }
}

#[derive(Default)]
pub struct InMemoryTradeRepository {
    rows: Mutex<HashMap<String, Trade>>,
}

impl InMemoryTradeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeRepository for InMemoryTradeRepository {
    fn save(&self, trade: Trade) -> EngineResult<()> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(trade.trade_id.to_string(), trade);
        Ok(())
    }

    // Relies on `SubmitOrderUseCase` generating order ids as
    // "{position_id}-{idempotency_key}"; a real repository would join
    // through the order table instead of parsing the id.
    fn list_for_position(&self, position_id: &PositionId) -> EngineResult<Vec<Trade>> {
        Ok(self
            .rows
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|t| t.order_id.as_str().starts_with(position_id.as_str()))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    rows: Mutex<Vec<Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventRepository for InMemoryEventRepository {
    fn append(&self, event: Event) -> EngineResult<()> {
        self.rows.lock().expect("lock poisoned").push(event);
        Ok(())
    }

    fn list_for_position(&self, position_id: &PositionId) -> EngineResult<Vec<Event>> {
        Ok(self
            .rows
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|e| e.position_id.as_str() == position_id.as_str())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTimelineRepository {
    rows: Mutex<Vec<TimelineRow>>,
}

impl InMemoryTimelineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<TimelineRow> {
        self.rows.lock().expect("lock poisoned").clone()
    }
}

impl TimelineRepository for InMemoryTimelineRepository {
    fn append(&self, row: TimelineRow) -> EngineResult<()> {
        self.rows.lock().expect("lock poisoned").push(row);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDividendRepository {
    rows: Mutex<HashMap<String, Dividend>>,
}

impl InMemoryDividendRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DividendRepository for InMemoryDividendRepository {
    fn save(&self, dividend: Dividend) -> EngineResult<()> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(dividend.dividend_id.to_string(), dividend);
        Ok(())
    }

    fn get(&self, dividend_id: &DividendId) -> EngineResult<Dividend> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .get(dividend_id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::InvalidDividend(dividend_id.to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryDividendReceivableRepository {
    rows: Mutex<HashMap<String, DividendReceivable>>,
}

impl InMemoryDividendReceivableRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DividendReceivableRepository for InMemoryDividendReceivableRepository {
    fn save(&self, receivable: DividendReceivable) -> EngineResult<()> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .insert(receivable.receivable_id.to_string(), receivable);
        Ok(())
    }

    fn get(&self, receivable_id: &ReceivableId) -> EngineResult<DividendReceivable> {
        self.rows
            .lock()
            .expect("lock poisoned")
            .get(receivable_id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::ReceivableNotFound(receivable_id.to_string()))
    }
}

/// Atomic compare-and-set on `(position_id, idempotency_key)`.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    rows: Mutex<HashMap<(String, String), String>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn check_and_reserve(
        &self,
        position_id: &PositionId,
        key: &str,
        signature: &str,
    ) -> EngineResult<IdempotencyOutcome> {
        let mut rows = self.rows.lock().expect("lock poisoned");
        let map_key = (position_id.to_string(), key.to_string());
        match rows.get(&map_key) {
            Some(existing_signature) if existing_signature == signature => {
                Ok(IdempotencyOutcome::ExistingMatch)
            }
            Some(_) => Ok(IdempotencyOutcome::SignatureMismatch),
            None => {
                rows.insert(map_key, signature.to_string());
                Ok(IdempotencyOutcome::Reserved)
            }
        }
    }
}

/// Hierarchical lookup: `position -> tenant -> GLOBAL` (commission rates
/// resolve `(tenant, asset) -> GLOBAL`). First hit wins, grounded on the
/// `Frequency`/config-block style in `src/alator/src/types/mod.rs` rather
/// than a dynamic config map.
#[derive(Default)]
pub struct InMemoryConfigStore {
    commission_rates: HashMap<String, f64>,
    trigger_configs: HashMap<String, TriggerConfig>,
    guardrail_configs: HashMap<String, GuardrailConfig>,
    order_policies: HashMap<String, OrderPolicy>,
    tenant_trigger_configs: HashMap<String, TriggerConfig>,
    tenant_guardrail_configs: HashMap<String, GuardrailConfig>,
    tenant_order_policies: HashMap<String, OrderPolicy>,
    global_commission_rate: f64,
    global_trigger: TriggerConfig,
    global_guardrail: GuardrailConfig,
    global_order_policy: OrderPolicy,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self {
            global_commission_rate: 0.0001,
            global_trigger: TriggerConfig::default(),
            global_guardrail: GuardrailConfig::default(),
            global_order_policy: OrderPolicy::default(),
            ..Default::default()
        }
    }

    pub fn set_commission_rate(&mut self, tenant: &TenantId, asset: &str, rate: f64) {
        self.commission_rates
            .insert(format!("{tenant}:{asset}"), rate);
    }

    pub fn set_position_trigger_config(&mut self, position: &PositionId, config: TriggerConfig) {
        self.trigger_configs.insert(position.to_string(), config);
    }

    pub fn set_position_guardrail_config(&mut self, position: &PositionId, config: GuardrailConfig) {
        self.guardrail_configs.insert(position.to_string(), config);
    }

    pub fn set_position_order_policy(&mut self, position: &PositionId, policy: OrderPolicy) {
        self.order_policies.insert(position.to_string(), policy);
    }

    pub fn set_tenant_trigger_config(&mut self, tenant: &TenantId, config: TriggerConfig) {
        self.tenant_trigger_configs.insert(tenant.to_string(), config);
    }

    pub fn set_tenant_guardrail_config(&mut self, tenant: &TenantId, config: GuardrailConfig) {
        self.tenant_guardrail_configs.insert(tenant.to_string(), config);
    }

    pub fn set_tenant_order_policy(&mut self, tenant: &TenantId, policy: OrderPolicy) {
        self.tenant_order_policies.insert(tenant.to_string(), policy);
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get_commission_rate(&self, tenant: &TenantId, asset: &str) -> f64 {
        self.commission_rates
            .get(&format!("{tenant}:{asset}"))
            .copied()
            .unwrap_or(self.global_commission_rate)
    }

    fn get_trigger_config(
        &self,
        tenant: &TenantId,
        _portfolio: &PortfolioId,
        position: &PositionId,
    ) -> TriggerConfig {
        self.trigger_configs
            .get(position.as_str())
            .or_else(|| self.tenant_trigger_configs.get(tenant.as_str()))
            .copied()
            .unwrap_or(self.global_trigger)
    }

    fn get_guardrail_config(
        &self,
        tenant: &TenantId,
        _portfolio: &PortfolioId,
        position: &PositionId,
    ) -> GuardrailConfig {
        self.guardrail_configs
            .get(position.as_str())
            .or_else(|| self.tenant_guardrail_configs.get(tenant.as_str()))
            .copied()
            .unwrap_or(self.global_guardrail)
    }

    fn get_order_policy(
        &self,
        tenant: &TenantId,
        _portfolio: &PortfolioId,
        position: &PositionId,
    ) -> OrderPolicy {
        self.order_policies
            .get(position.as_str())
            .or_else(|| self.tenant_order_policies.get(tenant.as_str()))
            .copied()
            .unwrap_or(self.global_order_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_store_reserves_once_then_matches() {
        let store = InMemoryIdempotencyStore::new();
        let position = PositionId::from("p1");
        assert_eq!(
            store.check_and_reserve(&position, "k1", "sig-a").unwrap(),
            IdempotencyOutcome::Reserved
        );
        assert_eq!(
            store.check_and_reserve(&position, "k1", "sig-a").unwrap(),
            IdempotencyOutcome::ExistingMatch
        );
        assert_eq!(
            store.check_and_reserve(&position, "k1", "sig-b").unwrap(),
            IdempotencyOutcome::SignatureMismatch
        );
    }

    #[test]
    fn config_store_falls_back_to_global_when_no_override() {
        let store = InMemoryConfigStore::new();
        let tenant = TenantId::from("t1");
        assert_eq!(store.get_commission_rate(&tenant, "ACME"), 0.0001);
    }

    #[test]
    fn config_store_prefers_position_override() {
        let mut store = InMemoryConfigStore::new();
        let position = PositionId::from("p1");
        store.set_position_trigger_config(&position, TriggerConfig::new(0.05, 0.05));
        let tenant = TenantId::from("t1");
        let portfolio = PortfolioId::from("pf1");
        let config = store.get_trigger_config(&tenant, &portfolio, &position);
        assert_eq!(config.up_threshold_pct.value(), 0.05);
    }

    #[test]
    fn config_store_falls_back_through_tenant_before_global() {
        let mut store = InMemoryConfigStore::new();
        let tenant = TenantId::from("t1");
        let portfolio = PortfolioId::from("pf1");
        let position = PositionId::from("p1");

        store.set_tenant_trigger_config(&tenant, TriggerConfig::new(0.08, 0.08));
        let resolved = store.get_trigger_config(&tenant, &portfolio, &position);
        assert_eq!(resolved.up_threshold_pct.value(), 0.08, "no position override, tenant wins over global");

        store.set_position_trigger_config(&position, TriggerConfig::new(0.02, 0.02));
        let resolved = store.get_trigger_config(&tenant, &portfolio, &position);
        assert_eq!(resolved.up_threshold_pct.value(), 0.02, "position override still wins over tenant");

        let other_tenant = TenantId::from("t2");
        let other_position = PositionId::from("p2");
        let resolved = store.get_trigger_config(&other_tenant, &portfolio, &other_position);
        assert_eq!(resolved.up_threshold_pct.value(), 0.03, "unrelated tenant falls through to global");
    }
}
