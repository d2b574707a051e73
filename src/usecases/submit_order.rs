//! Idempotent order creation. Grounded on the validate-then-mutate
//! sequencing of `SimulatedBroker::check` in `src/sim/mod.rs`: nothing is
//! persisted until every precondition has passed.

use log::info;
use serde_json::json;

use crate::domain::ids::{EventSeq, OrderId, PositionId, PortfolioId, TenantId};
use crate::errors::{EngineError, EngineResult};
use crate::event::{EventLog, EventType};
use crate::order::{Order, OrderSide};
use crate::ports::{ConfigStore, IdempotencyOutcome, IdempotencyStore, OrderRepository};
use crate::types::{EngineDateTime, Shares};

pub struct SubmitOrderRequest {
    pub tenant_id: TenantId,
    pub portfolio_id: PortfolioId,
    pub position_id: PositionId,
    pub asset_symbol: String,
    pub side: OrderSide,
    pub qty: Shares,
    pub idempotency_key: String,
    pub request_signature: String,
    pub last_known_price: Option<f64>,
    pub now: EngineDateTime,
    pub trace_id: String,
}

pub struct SubmitOrderResponse {
    pub order_id: OrderId,
    pub accepted: bool,
    pub newly_created: bool,
}

pub struct SubmitOrderUseCase<'a, O, C> {
    pub orders: &'a O,
    pub idempotency: &'a dyn IdempotencyStore,
    pub config: &'a C,
}

impl<'a, O, C> SubmitOrderUseCase<'a, O, C>
where
    O: OrderRepository,
    C: ConfigStore,
{
    pub fn execute(
        &self,
        request: SubmitOrderRequest,
        events: &mut EventLog,
        parent_event_id: Option<EventSeq>,
    ) -> EngineResult<SubmitOrderResponse> {
        match self.idempotency.check_and_reserve(
            &request.position_id,
            &request.idempotency_key,
            &request.request_signature,
        )? {
            IdempotencyOutcome::SignatureMismatch => {
                return Err(EngineError::IdempotencyConflict(request.idempotency_key));
            }
            IdempotencyOutcome::ExistingMatch => {
                let existing = self
                    .orders
                    .find_by_idempotency_key(&request.position_id, &request.idempotency_key)?
                    .ok_or_else(|| {
                        EngineError::DataInconsistency(
                            "idempotency store reserved a key with no matching order".into(),
                        )
                    })?;
                return Ok(SubmitOrderResponse {
                    order_id: existing.order_id,
                    accepted: true,
                    newly_created: false,
                });
            }
            IdempotencyOutcome::Reserved => {}
        }

        let rate = self
            .config
            .get_commission_rate(&request.tenant_id, &request.asset_symbol);

        let commission_estimated = request
            .last_known_price
            .map(|price| request.qty.value() * price * rate);

        let order_id = OrderId::from(format!(
            "{}-{}",
            request.position_id.as_str(),
            request.idempotency_key
        ));

        let mut order = Order::new(
            order_id.clone(),
            request.tenant_id.clone(),
            request.portfolio_id.clone(),
            request.position_id.clone(),
            request.side,
            request.qty,
            request.idempotency_key.clone(),
            request.request_signature.clone(),
            rate,
            request.now,
        );
        order.commission_estimated = commission_estimated;
        self.orders.save(order)?;

        info!(
            "ORDER: submitted {:?} {} {} for position {}",
            request.side,
            request.qty.value(),
            order_id,
            request.position_id
        );

        events.record(
            request.position_id,
            request.tenant_id,
            request.portfolio_id,
            EventType::OrderCreated,
            request.trace_id,
            parent_event_id,
            request.now,
            json!({"side": format!("{:?}", request.side), "qty": request.qty.value()}),
            json!({"order_id": order_id.to_string(), "commission_rate_snapshot": rate}),
            "order created",
        );

        Ok(SubmitOrderResponse {
            order_id,
            accepted: true,
            newly_created: true,
        })
    }
}
