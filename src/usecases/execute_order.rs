//! Applies a fill: re-checks guardrails at the fill price, mutates the
//! position, records an immutable trade, advances order status. Grounded on
//! the `reconcile_exchange`/`rebalance_cash` sequencing in
//! `src/sim/mod.rs`'s `SimulatedBroker::check`.

use log::info;
use serde_json::json;

use crate::domain::ids::{EventSeq, TradeId};
use crate::errors::{EngineError, EngineResult};
use crate::event::{EventLog, EventType};
use crate::order::{Order, OrderStatus};
use crate::position::Position;
use crate::services::guardrail::evaluate_guardrails;
use crate::services::trigger::TriggerDirection;
use crate::trade::Trade;
use crate::types::{CashValue, EngineDateTime, Price, Shares};

pub struct FillRequest {
    pub qty: Shares,
    pub price: Price,
    pub commission: CashValue,
    pub executed_at: EngineDateTime,
    pub orders_today: u32,
}

pub struct ExecuteOrderResponse {
    pub status: OrderStatus,
    pub filled_qty: Shares,
    pub trade: Trade,
}

pub struct ExecuteOrderUseCase;

impl ExecuteOrderUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        order: &mut Order,
        position: &mut Position,
        fill: FillRequest,
        trace_id: &str,
        parent_event_id: Option<EventSeq>,
        events: &mut EventLog,
        make_trade_id: impl FnOnce() -> TradeId,
    ) -> EngineResult<ExecuteOrderResponse> {
        if order.status != OrderStatus::Submitted {
            return Err(EngineError::OrderNotSubmitted(order.order_id.to_string()));
        }

        let direction = match order.side {
            crate::order::OrderSide::Buy => TriggerDirection::Buy,
            crate::order::OrderSide::Sell => TriggerDirection::Sell,
        };

        let decision = evaluate_guardrails(
            direction,
            fill.qty,
            position.qty,
            position.get_effective_cash(),
            fill.price,
            fill.commission,
            &position.guardrail_config,
            fill.orders_today,
            position.order_policy.min_notional,
        );

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::GuardrailEvaluated,
            trace_id,
            parent_event_id,
            fill.executed_at,
            json!({"qty": fill.qty.value(), "price": fill.price.value()}),
            json!({"allowed": decision.allowed, "trimmed_qty": decision.trimmed_qty.value()}),
            "guardrail re-checked at execute time",
        );

        if !decision.allowed {
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::GuardrailBlocked,
                trace_id,
                parent_event_id,
                fill.executed_at,
                json!({}),
                json!({"reason": decision.block_reason}),
                "execute-time guardrail breach; order left submitted for caller policy",
            );
            return Err(EngineError::GuardrailBreach(
                decision.block_reason.unwrap_or_default(),
            ));
        }

        let filled_qty = decision.trimmed_qty;
        let pre_cash = position.cash;
        let pre_qty = position.qty;

        match order.side {
            crate::order::OrderSide::Buy => {
                position.apply_buy(filled_qty, fill.price, fill.commission, fill.executed_at);
            }
            crate::order::OrderSide::Sell => {
                position
                    .apply_sell(filled_qty, fill.price, fill.commission, fill.executed_at)
                    .map_err(EngineError::InsufficientResources)?;
            }
        }

        position.set_anchor(fill.price, fill.executed_at);
        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::AnchorUpdated,
            trace_id,
            parent_event_id,
            fill.executed_at,
            json!({"price": fill.price.value()}),
            json!({}),
            "anchor updated to fill price",
        );

        let trade_id = make_trade_id();
        let trade = Trade::new(
            trade_id.clone(),
            order.order_id.clone(),
            order.side,
            filled_qty,
            fill.price,
            fill.commission,
            fill.executed_at,
        );

        let execution_event = events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::ExecutionRecorded,
            trace_id,
            parent_event_id,
            fill.executed_at,
            json!({"order_id": order.order_id.to_string()}),
            json!({"trade_id": trade_id.to_string(), "qty": filled_qty.value(), "price": fill.price.value()}),
            "fill recorded",
        );

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::PositionUpdated,
            trace_id,
            Some(execution_event),
            fill.executed_at,
            json!({"pre_qty": pre_qty.value(), "pre_cash": pre_cash.value()}),
            json!({"post_qty": position.qty.value(), "post_cash": position.cash.value()}),
            "position mutated",
        );

        order.transition_to(OrderStatus::Filled, fill.executed_at);

        info!(
            "ORDER: filled {} qty={} price={} for position {}",
            order.order_id,
            filled_qty.value(),
            fill.price.value(),
            position.position_id
        );

        Ok(ExecuteOrderResponse {
            status: order.status,
            filled_qty,
            trade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
    use crate::domain::ids::{OrderId, PositionId, PortfolioId, TenantId};
    use crate::order::{Order, OrderSide};

    fn setup() -> (Position, Order, EventLog) {
        let position = Position::new(
            TenantId::from("t1"),
            PortfolioId::from("pf1"),
            PositionId::from("pos1"),
            "ACME",
            CashValue::from(10_000.0),
            Shares::from(0.0),
            Some(Price::from(100.0)),
            TriggerConfig::default(),
            GuardrailConfig::default(),
            OrderPolicy::default(),
            EngineDateTime::from(0_i64),
        );
        let order = Order::new(
            OrderId::from("o1"),
            TenantId::from("t1"),
            PortfolioId::from("pf1"),
            PositionId::from("pos1"),
            OrderSide::Buy,
            Shares::from(5.313),
            "key-1",
            "sig-1",
            0.0001,
            EngineDateTime::from(0_i64),
        );
        (position, order, EventLog::new())
    }

    #[test]
    fn scenario_1_execute_buy_matches_spec_math() {
        let (mut position, mut order, mut events) = setup();
        let use_case = ExecuteOrderUseCase;
        let response = use_case
            .execute(
                &mut order,
                &mut position,
                FillRequest {
                    qty: Shares::from(5.313),
                    price: Price::from(97.0),
                    commission: CashValue::from(5.313 * 97.0 * 0.0001),
                    executed_at: EngineDateTime::from(1_i64),
                    orders_today: 0,
                },
                "trace-1",
                None,
                &mut events,
                || TradeId::from("tr1"),
            )
            .unwrap();

        assert_eq!(response.status, OrderStatus::Filled);
        assert!((position.cash.value() - 9_484.59).abs() < 1.0);
        assert_eq!(position.anchor_price.unwrap().value(), 97.0);
        assert!(events.len() >= 4);
    }

    #[test]
    fn execute_order_rejects_already_filled_orders() {
        let (mut position, mut order, mut events) = setup();
        order.status = OrderStatus::Filled;
        let use_case = ExecuteOrderUseCase;
        let result = use_case.execute(
            &mut order,
            &mut position,
            FillRequest {
                qty: Shares::from(1.0),
                price: Price::from(97.0),
                commission: CashValue::from(0.0),
                executed_at: EngineDateTime::from(1_i64),
                orders_today: 0,
            },
            "trace-1",
            None,
            &mut events,
            || TradeId::from("tr1"),
        );
        assert!(result.is_err());
    }
}
