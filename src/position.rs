//! The position aggregate root: a self-contained cell combining one asset
//! with dedicated cash. Grounded on `SimulatedBroker`'s `credit`/`debit`
//! mutation style (`src/sim/mod.rs`), restructured as methods on a single
//! owned aggregate since each position here already scopes one asset (no
//! broker-wide `HashMap<String, Qty>` is needed).

use crate::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
use crate::domain::ids::{PortfolioId, PositionId, TenantId};
use crate::types::{CashValue, EngineDateTime, Price, Shares};

const ANCHOR_FLOOR: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct Position {
    pub tenant_id: TenantId,
    pub portfolio_id: PortfolioId,
    pub position_id: PositionId,
    pub asset_symbol: String,
    pub qty: Shares,
    pub cash: CashValue,
    pub anchor_price: Option<Price>,
    pub avg_cost: Option<Price>,
    pub dividend_receivable: CashValue,
    pub total_commission_paid: CashValue,
    pub total_dividends_received: CashValue,
    pub trigger_config: TriggerConfig,
    pub guardrail_config: GuardrailConfig,
    pub order_policy: OrderPolicy,
    pub created_at: EngineDateTime,
    pub updated_at: EngineDateTime,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        portfolio_id: PortfolioId,
        position_id: PositionId,
        asset_symbol: impl Into<String>,
        initial_cash: CashValue,
        initial_qty: Shares,
        initial_anchor: Option<Price>,
        trigger_config: TriggerConfig,
        guardrail_config: GuardrailConfig,
        order_policy: OrderPolicy,
        created_at: EngineDateTime,
    ) -> Self {
        Self {
            tenant_id,
            portfolio_id,
            position_id,
            asset_symbol: asset_symbol.into(),
            qty: initial_qty,
            cash: initial_cash,
            anchor_price: initial_anchor,
            avg_cost: None,
            dividend_receivable: CashValue::from(0.0),
            total_commission_paid: CashValue::from(0.0),
            total_dividends_received: CashValue::from(0.0),
            trigger_config,
            guardrail_config,
            order_policy,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn get_effective_cash(&self) -> CashValue {
        self.cash + self.dividend_receivable
    }

    pub fn assert_invariants(&self) {
        debug_assert!(self.qty.value() >= 0.0, "qty went negative: {:?}", self.qty);
        debug_assert!(
            f64::from(self.cash) + f64::from(self.dividend_receivable) >= -1e-6,
            "cash + dividend_receivable went negative"
        );
        if let Some(anchor) = self.anchor_price {
            debug_assert!(anchor.value() > 0.0, "anchor_price must be positive or null");
        }
    }

    pub fn apply_buy(&mut self, qty: Shares, price: Price, commission: CashValue, at: EngineDateTime) {
        let notional = qty.value() * price.value();
        let prior_qty = self.qty.value();
        let prior_cost = self.avg_cost.map(|p| p.value()).unwrap_or(0.0);
        let new_qty = prior_qty + qty.value();

        self.avg_cost = if new_qty > 0.0 {
            Some(Price::from(
                (prior_cost * prior_qty + price.value() * qty.value()) / new_qty,
            ))
        } else {
            self.avg_cost
        };

        self.qty = Shares::from(new_qty);
        self.cash -= CashValue::from(notional + commission.value());
        self.total_commission_paid += commission;
        self.updated_at = at;
        self.assert_invariants();
    }

    /// Fails if `qty > qty_held`; the caller (guardrails) is responsible for
    /// ensuring that never happens — this is the last-line defence.
    pub fn apply_sell(
        &mut self,
        qty: Shares,
        price: Price,
        commission: CashValue,
        at: EngineDateTime,
    ) -> Result<(), String> {
        if qty.value() > self.qty.value() + 1e-9 {
            return Err(format!(
                "cannot sell {} shares, only {} held",
                qty.value(),
                self.qty.value()
            ));
        }
        let notional = qty.value() * price.value();
        self.qty = Shares::from(self.qty.value() - qty.value());
        self.cash += CashValue::from(notional - commission.value());
        self.total_commission_paid += commission;
        self.updated_at = at;
        self.assert_invariants();
        Ok(())
    }

    /// `anchor := max(anchor - dps, ANCHOR_FLOOR)`. No-op if unarmed.
    /// Returns `true` if the floor was hit (caller logs `ANCHOR_FLOORED`).
    pub fn adjust_anchor_for_dividend(&mut self, dps: f64, at: EngineDateTime) -> bool {
        let Some(anchor) = self.anchor_price else {
            return false;
        };
        let raw = anchor.value() - dps;
        let floored = raw <= ANCHOR_FLOOR;
        self.anchor_price = Some(Price::from(raw.max(ANCHOR_FLOOR)));
        self.updated_at = at;
        floored
    }

    pub fn accrue_receivable(&mut self, net_amount: CashValue, at: EngineDateTime) {
        self.dividend_receivable += net_amount;
        self.updated_at = at;
    }

    /// Requires `net_amount <= dividend_receivable` within rounding
    /// tolerance.
    pub fn pay_receivable(&mut self, net_amount: CashValue, at: EngineDateTime) -> Result<(), String> {
        if net_amount.value() > self.dividend_receivable.value() + 1e-6 {
            return Err(format!(
                "cannot pay {} against receivable of {}",
                net_amount.value(),
                self.dividend_receivable.value()
            ));
        }
        self.cash += net_amount;
        self.dividend_receivable -= net_amount;
        self.total_dividends_received += net_amount;
        self.updated_at = at;
        self.assert_invariants();
        Ok(())
    }

    pub fn set_anchor(&mut self, price: Price, at: EngineDateTime) {
        self.anchor_price = Some(price);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(qty: f64, cash: f64, anchor: f64) -> Position {
        Position::new(
            TenantId::from("t1"),
            PortfolioId::from("pf1"),
            PositionId::from("pos1"),
            "ACME",
            CashValue::from(cash),
            Shares::from(qty),
            Some(Price::from(anchor)),
            TriggerConfig::default(),
            GuardrailConfig::default(),
            OrderPolicy::default(),
            EngineDateTime::from(0_i64),
        )
    }

    #[test]
    fn apply_buy_increases_qty_and_reduces_cash_by_notional_plus_commission() {
        let mut position = setup(0.0, 10_000.0, 100.0);
        position.apply_buy(
            Shares::from(5.313),
            Price::from(97.0),
            CashValue::from(0.0516),
            EngineDateTime::from(1_i64),
        );
        assert!((position.qty.value() - 5.313).abs() < 1e-9);
        assert!((position.cash.value() - (10_000.0 - 5.313 * 97.0 - 0.0516)).abs() < 1e-6);
    }

    #[test]
    fn apply_sell_rejects_overselling() {
        let mut position = setup(10.0, 0.0, 100.0);
        let result = position.apply_sell(
            Shares::from(20.0),
            Price::from(100.0),
            CashValue::from(0.0),
            EngineDateTime::from(1_i64),
        );
        assert!(result.is_err());
    }

    #[test]
    fn adjust_anchor_for_dividend_floors_at_epsilon_when_dividend_exceeds_anchor() {
        let mut position = setup(100.0, 0.0, 0.5);
        let floored = position.adjust_anchor_for_dividend(2.0, EngineDateTime::from(1_i64));
        assert!(floored);
        assert_eq!(position.anchor_price.unwrap().value(), ANCHOR_FLOOR);
    }

    #[test]
    fn pay_receivable_matches_scenario_4() {
        let mut position = setup(100.0, 5_000.0, 100.0);
        position.accrue_receivable(CashValue::from(150.0), EngineDateTime::from(1_i64));
        position.adjust_anchor_for_dividend(2.0, EngineDateTime::from(1_i64));
        assert_eq!(position.anchor_price.unwrap().value(), 98.0);
        position.pay_receivable(CashValue::from(150.0), EngineDateTime::from(2_i64)).unwrap();
        assert_eq!(position.cash.value(), 5_150.0);
        assert_eq!(position.dividend_receivable.value(), 0.0);
        assert_eq!(position.total_dividends_received.value(), 150.0);
    }

    #[test]
    fn effective_cash_includes_dividend_receivable() {
        let mut position = setup(0.0, 1_000.0, 100.0);
        position.accrue_receivable(CashValue::from(50.0), EngineDateTime::from(1_i64));
        assert_eq!(position.get_effective_cash().value(), 1_050.0);
    }
}
