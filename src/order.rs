//! Trade intent with an idempotent-submission lifecycle. Grounded on
//! `Order`/`OrderType` in `src/broker/types.rs` and the `ready_state`-style
//! state machine in `src/sim/mod.rs`.

use crate::domain::ids::{OrderId, PositionId, PortfolioId, TenantId};
use crate::types::{EngineDateTime, Shares};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Filled,
    PartiallyExecuted,
    Cancelled,
    Expired,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Expired
                | OrderStatus::Rejected
        )
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub portfolio_id: PortfolioId,
    pub position_id: PositionId,
    pub side: OrderSide,
    pub qty: Shares,
    pub status: OrderStatus,
    pub idempotency_key: String,
    pub request_signature: String,
    pub commission_rate_snapshot: f64,
    pub commission_estimated: Option<f64>,
    pub created_at: EngineDateTime,
    pub updated_at: EngineDateTime,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        tenant_id: TenantId,
        portfolio_id: PortfolioId,
        position_id: PositionId,
        side: OrderSide,
        qty: Shares,
        idempotency_key: impl Into<String>,
        request_signature: impl Into<String>,
        commission_rate_snapshot: f64,
        created_at: EngineDateTime,
    ) -> Self {
        Self {
            order_id,
            tenant_id,
            portfolio_id,
            position_id,
            side,
            qty,
            status: OrderStatus::Submitted,
            idempotency_key: idempotency_key.into(),
            request_signature: request_signature.into(),
            commission_rate_snapshot,
            commission_estimated: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Transitions to a terminal state. Panics if already terminal — that is
    /// a programming error, not a domain outcome (status is monotonic along
    /// `submitted -> {filled, cancelled, expired, rejected}`).
    pub fn transition_to(&mut self, status: OrderStatus, at: EngineDateTime) {
        assert!(
            !self.status.is_terminal(),
            "order {} already in terminal state {:?}",
            self.order_id,
            self.status
        );
        self.status = status;
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Order {
        Order::new(
            OrderId::from("o1"),
            TenantId::from("t1"),
            PortfolioId::from("pf1"),
            PositionId::from("pos1"),
            OrderSide::Buy,
            Shares::from(1.5),
            "key-1",
            "sig-1",
            0.0001,
            EngineDateTime::from(0_i64),
        )
    }

    #[test]
    fn new_order_starts_submitted() {
        let order = setup();
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(!order.status.is_terminal());
    }

    #[test]
    fn transition_to_filled_marks_terminal() {
        let mut order = setup();
        order.transition_to(OrderStatus::Filled, EngineDateTime::from(1_i64));
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.status.is_terminal());
    }

    #[test]
    #[should_panic(expected = "already in terminal state")]
    fn transition_out_of_terminal_panics() {
        let mut order = setup();
        order.transition_to(OrderStatus::Filled, EngineDateTime::from(1_i64));
        order.transition_to(OrderStatus::Cancelled, EngineDateTime::from(2_i64));
    }
}
