//! Immutable execution record. Grounded on `Trade` in `src/broker/mod.rs`,
//! with the rate/notional relationship spelled out explicitly per the
//! commission-as-rate design note.

use crate::domain::ids::{OrderId, TradeId};
use crate::order::OrderSide;
use crate::types::{CashValue, EngineDateTime, Price, Shares};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeStatus {
    Executed,
}

#[derive(Clone, Debug)]
pub struct Trade {
    pub trade_id: TradeId,
    pub order_id: OrderId,
    pub side: OrderSide,
    pub qty: Shares,
    pub price: Price,
    pub commission: CashValue,
    pub executed_at: EngineDateTime,
    pub status: TradeStatus,
}

impl Trade {
    pub fn new(
        trade_id: TradeId,
        order_id: OrderId,
        side: OrderSide,
        qty: Shares,
        price: Price,
        commission: CashValue,
        executed_at: EngineDateTime,
    ) -> Self {
        Self {
            trade_id,
            order_id,
            side,
            qty,
            price,
            commission,
            executed_at,
            status: TradeStatus::Executed,
        }
    }

    pub fn notional(&self) -> f64 {
        self.qty.value() * self.price.value()
    }

    /// `commission / (qty * price)`; `None` when notional is zero.
    pub fn commission_rate_effective(&self) -> Option<f64> {
        let notional = self.notional();
        if notional.abs() < f64::EPSILON {
            None
        } else {
            Some(self.commission.value() / notional)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_rate_effective_divides_commission_by_notional() {
        let trade = Trade::new(
            TradeId::from("t1"),
            OrderId::from("o1"),
            OrderSide::Buy,
            Shares::from(5.0),
            Price::from(100.0),
            CashValue::from(0.5),
            EngineDateTime::from(0_i64),
        );
        assert_eq!(trade.commission_rate_effective(), Some(0.001));
    }

    #[test]
    fn commission_rate_effective_is_none_at_zero_notional() {
        let trade = Trade::new(
            TradeId::from("t1"),
            OrderId::from("o1"),
            OrderSide::Buy,
            Shares::from(0.0),
            Price::from(100.0),
            CashValue::from(0.0),
            EngineDateTime::from(0_i64),
        );
        assert_eq!(trade.commission_rate_effective(), None);
    }
}
