//! The conductor of one evaluation cycle (§4.8): anchor self-heal -> trigger
//! -> sizing -> guardrail -> optional submit+execute -> timeline row.
//! Grounded on `SimulatedBroker::check`'s fixed step sequence in
//! `src/sim/mod.rs`.

use log::info;
use serde_json::json;

use crate::domain::ids::TradeId;
use crate::domain::quote::MarketQuote;
use crate::errors::EngineResult;
use crate::event::{EventLog, EventType};
use crate::order::OrderSide;
use crate::ports::{ConfigStore, IdempotencyStore, OrderRepository, TimelineRepository, TradeRepository};
use crate::position::Position;
use crate::services::guardrail::evaluate_guardrails;
use crate::services::sizing::compute_sizing;
use crate::services::trigger::{evaluate_trigger, self_heal_anchor, TriggerDirection};
use crate::timeline::{ActionTaken, TimelineRow};
use crate::types::CashValue;
use crate::usecases::execute_order::{ExecuteOrderUseCase, FillRequest};
use crate::usecases::submit_order::{SubmitOrderRequest, SubmitOrderUseCase};

pub struct EvaluatePositionUseCase<'a, O, C, T, L> {
    pub submit_order: SubmitOrderUseCase<'a, O, C>,
    pub execute_order: ExecuteOrderUseCase,
    pub trades: &'a T,
    pub timeline: &'a L,
}

fn direction_to_side(direction: TriggerDirection) -> Option<OrderSide> {
    match direction {
        TriggerDirection::Buy => Some(OrderSide::Buy),
        TriggerDirection::Sell => Some(OrderSide::Sell),
        TriggerDirection::None => None,
    }
}

impl<'a, O, C, T, L> EvaluatePositionUseCase<'a, O, C, T, L>
where
    O: OrderRepository,
    C: ConfigStore,
    T: TradeRepository,
    L: TimelineRepository,
{
    fn finish(&self, row: TimelineRow) -> EngineResult<TimelineRow> {
        self.timeline.append(row.clone())?;
        Ok(row)
    }

    /// `auto_arm_on_first_quote` mirrors step 2: positions created without an
    /// anchor arm on the first quote instead of evaluating a trigger.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        position: &mut Position,
        quote: MarketQuote,
        trace_id: String,
        orders_today: u32,
        auto_arm_on_first_quote: bool,
        events: &mut EventLog,
        make_trade_id: impl FnOnce() -> TradeId,
    ) -> EngineResult<TimelineRow> {
        let effective_price = quote.effective_price();
        let pre_qty = position.qty;
        let pre_cash = position.cash;

        let price_event = events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::PriceEvent,
            trace_id.clone(),
            None,
            quote.timestamp,
            json!({"price": effective_price.value()}),
            json!({}),
            "quote received",
        );

        let mut row = TimelineRow {
            position_id: position.position_id.clone(),
            trace_id: trace_id.clone(),
            timestamp: quote.timestamp,
            pre_qty,
            post_qty: pre_qty,
            pre_cash,
            post_cash: pre_cash,
            effective_price,
            anchor_price: position.anchor_price,
            trigger_fired: false,
            allocation_before: None,
            allocation_after: None,
            action_taken: ActionTaken::None,
            reason: String::new(),
        };

        if position.anchor_price.is_none() && auto_arm_on_first_quote {
            position.set_anchor(effective_price, quote.timestamp);
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::AnchorSet,
                trace_id,
                Some(price_event),
                quote.timestamp,
                json!({}),
                json!({"anchor": effective_price.value()}),
                "anchor armed on first quote",
            );
            row.anchor_price = Some(effective_price);
            row.reason = "anchor_set".to_string();
            return self.finish(row);
        }

        if let Some(new_anchor) = self_heal_anchor(position.anchor_price, effective_price) {
            position.set_anchor(new_anchor, quote.timestamp);
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::AnchorReset,
                trace_id,
                Some(price_event),
                quote.timestamp,
                json!({"gap_price": effective_price.value()}),
                json!({"anchor": new_anchor.value()}),
                "anchor self-healed on large gap; no trade this cycle",
            );
            row.anchor_price = Some(new_anchor);
            row.reason = "anchor_reset".to_string();
            return self.finish(row);
        }

        let trigger = evaluate_trigger(&position.trigger_config, position.anchor_price, effective_price);

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::TriggerEvaluated,
            trace_id.clone(),
            Some(price_event),
            quote.timestamp,
            json!({"anchor": position.anchor_price.map(|p| p.value())}),
            json!({"fired": trigger.fired, "direction": format!("{:?}", trigger.direction)}),
            trigger.reason.clone(),
        );
        row.trigger_fired = trigger.fired;

        if !trigger.fired {
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::NoAction,
                trace_id,
                Some(price_event),
                quote.timestamp,
                json!({}),
                json!({}),
                trigger.reason.clone(),
            );
            row.reason = trigger.reason;
            return self.finish(row);
        }

        let anchor = position.anchor_price.expect("trigger fired implies anchor armed");
        let sizing = compute_sizing(
            trigger.direction,
            effective_price,
            anchor,
            position.qty,
            position.get_effective_cash(),
            &position.order_policy,
            &position.guardrail_config,
        );

        if sizing.no_action {
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::NoAction,
                trace_id,
                Some(price_event),
                quote.timestamp,
                json!({}),
                json!({}),
                sizing.reason.clone(),
            );
            row.reason = sizing.reason;
            return self.finish(row);
        }

        let commission_rate = position.order_policy.commission_rate.value();
        let estimated_commission =
            CashValue::from(sizing.qty.value() * effective_price.value() * commission_rate);

        let guardrail = evaluate_guardrails(
            trigger.direction,
            sizing.qty,
            position.qty,
            position.get_effective_cash(),
            effective_price,
            estimated_commission,
            &position.guardrail_config,
            orders_today,
            position.order_policy.min_notional,
        );

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::GuardrailEvaluated,
            trace_id.clone(),
            Some(price_event),
            quote.timestamp,
            json!({"proposed_qty": sizing.qty.value()}),
            json!({"allowed": guardrail.allowed, "trimmed_qty": guardrail.trimmed_qty.value()}),
            "guardrail evaluated at submit time",
        );
        row.allocation_before = Some(guardrail.allocation_before);
        row.allocation_after = Some(guardrail.allocation_after);

        if !guardrail.allowed {
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::NoAction,
                trace_id,
                Some(price_event),
                quote.timestamp,
                json!({}),
                json!({}),
                guardrail.block_reason.clone().unwrap_or_default(),
            );
            row.action_taken = ActionTaken::Blocked;
            row.reason = guardrail.block_reason.unwrap_or_default();
            return self.finish(row);
        }

        let side = direction_to_side(trigger.direction).expect("guardrail allowed implies a side");
        let idempotency_key = format!("{trace_id}-auto");
        let submit_response = self.submit_order.execute(
            SubmitOrderRequest {
                tenant_id: position.tenant_id.clone(),
                portfolio_id: position.portfolio_id.clone(),
                position_id: position.position_id.clone(),
                asset_symbol: position.asset_symbol.clone(),
                side,
                qty: guardrail.trimmed_qty,
                idempotency_key,
                request_signature: format!("{side:?}-{}", guardrail.trimmed_qty.value()),
                last_known_price: Some(effective_price.value()),
                now: quote.timestamp,
                trace_id: trace_id.clone(),
            },
            events,
            Some(price_event),
        )?;

        let mut order = self.submit_order.orders.get(&submit_response.order_id)?;

        let execute_response = self.execute_order.execute(
            &mut order,
            position,
            FillRequest {
                qty: guardrail.trimmed_qty,
                price: effective_price,
                commission: estimated_commission,
                executed_at: quote.timestamp,
                orders_today,
            },
            &trace_id,
            Some(price_event),
            events,
            make_trade_id,
        )?;

        self.submit_order.orders.save(order)?;

        row.post_qty = position.qty;
        row.post_cash = position.cash;
        row.action_taken = ActionTaken::OrderExecuted;
        row.reason = "executed".to_string();

        info!(
            "EVALUATE: position {} executed trade {} qty={}",
            position.position_id,
            execute_response.trade.trade_id,
            execute_response.filled_qty.value()
        );

        self.trades.save(execute_response.trade)?;

        self.finish(row)
    }
}
