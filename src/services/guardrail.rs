//! Pure guardrail evaluation: five ordered checks trimming a proposed
//! intent down to what the position's configured bands allow. Grounded on
//! `OrderExecutionRules::run_all` in `src/broker/order.rs` — a fixed
//! sequence of checks returning a verdict before any mutation happens.

use crate::domain::config::GuardrailConfig;
use crate::services::trigger::TriggerDirection;
use crate::types::{CashValue, Price, Shares};

#[derive(Clone, Debug, PartialEq)]
pub struct GuardrailDecision {
    pub allowed: bool,
    pub trimmed_qty: Shares,
    pub block_reason: Option<String>,
    pub allocation_before: f64,
    pub allocation_after: f64,
}

fn round_to_step(qty: f64, qty_step: f64, lot_size: f64) -> f64 {
    let step = if qty_step > 0.0 { qty_step } else { f64::EPSILON };
    let stepped = (qty / step).trunc() * step;
    if lot_size > 0.0 {
        (stepped / lot_size).trunc() * lot_size
    } else {
        stepped
    }
}

fn stock_pct(qty: f64, price: f64, cash: f64) -> f64 {
    let stock_value = qty * price;
    let denom = stock_value + cash;
    if denom.abs() < f64::EPSILON {
        0.0
    } else {
        stock_value / denom
    }
}

#[allow(clippy::too_many_arguments)]
pub fn evaluate_guardrails(
    side: TriggerDirection,
    proposed_qty: Shares,
    qty_held: Shares,
    effective_cash: CashValue,
    price: Price,
    estimated_commission: CashValue,
    config: &GuardrailConfig,
    orders_today: u32,
    min_notional: f64,
) -> GuardrailDecision {
    let p = price.value();
    let q_held = qty_held.value();
    let cash = effective_cash.value();
    let allocation_before = stock_pct(q_held, p, cash);

    let blocked = |reason: &str, before: f64| GuardrailDecision {
        allowed: false,
        trimmed_qty: Shares::from(0.0),
        block_reason: Some(reason.to_string()),
        allocation_before: before,
        allocation_after: before,
    };

    // 1. Daily cap.
    if orders_today >= config.max_orders_per_day {
        return blocked("daily_cap", allocation_before);
    }

    let mut qty = proposed_qty.value();

    // 2. Sufficient resources.
    match side {
        TriggerDirection::Buy => {
            let max_affordable = if p + estimated_commission.value() / qty.max(f64::EPSILON) > 0.0 {
                // qty * p + commission(qty) <= cash; commission here is a flat
                // estimate for the whole trade, so solve qty <= cash / p when
                // the estimate already reflects the proposed qty.
                (cash - estimated_commission.value()) / p
            } else {
                0.0
            };
            qty = qty.min(max_affordable.max(0.0));
            if qty <= 0.0 {
                return blocked("insufficient_cash", allocation_before);
            }
        }
        TriggerDirection::Sell => {
            qty = qty.min(q_held);
            if qty <= 0.0 {
                return blocked("insufficient_shares", allocation_before);
            }
        }
        TriggerDirection::None => {
            return blocked("no_direction", allocation_before);
        }
    }

    // 3. Max trade size.
    let position_value = q_held * p + cash;
    let max_notional = config.max_trade_pct_of_position.value() * position_value;
    if p > 0.0 {
        qty = qty.min(max_notional / p);
    }

    // 4. Post-trade allocation.
    let (qty_after, cash_after) = match side {
        TriggerDirection::Buy => (q_held + qty, cash - qty * p),
        TriggerDirection::Sell => (q_held - qty, cash + qty * p),
        TriggerDirection::None => (q_held, cash),
    };
    let mut allocation_after = stock_pct(qty_after, p, cash_after);

    match side {
        TriggerDirection::Buy => {
            if allocation_after > config.max_stock_pct.value() {
                // Trim BUY qty until stock_pct == max_stock_pct:
                // (q_held+x)p / ((q_held+x)p + cash-xp) = max
                let max_pct = config.max_stock_pct.value();
                let denom = p;
                if denom.abs() > f64::EPSILON {
                    let target_stock_value = max_pct * (q_held * p + cash);
                    let target_qty_after = target_stock_value / p;
                    qty = (target_qty_after - q_held).max(0.0);
                }
            }
        }
        TriggerDirection::Sell => {
            if allocation_after < config.min_stock_pct.value() {
                let min_pct = config.min_stock_pct.value();
                let target_stock_value = min_pct * (q_held * p + cash);
                let target_qty_after = target_stock_value / p;
                qty = (q_held - target_qty_after).max(0.0);
            }
        }
        TriggerDirection::None => {}
    }

    // 5. Final rounding, then re-check min_notional against the trimmed qty.
    qty = round_to_step(qty, config.qty_step, config.lot_size);

    if qty <= 0.0 {
        return blocked("allocation_band", allocation_before);
    }

    if qty * p < min_notional {
        return blocked("below_min_notional", allocation_before);
    }

    let (qty_after, cash_after) = match side {
        TriggerDirection::Buy => (q_held + qty, cash - qty * p),
        TriggerDirection::Sell => (q_held - qty, cash + qty * p),
        TriggerDirection::None => (q_held, cash),
    };
    allocation_after = stock_pct(qty_after, p, cash_after);

    GuardrailDecision {
        allowed: true,
        trimmed_qty: Shares::from(qty),
        block_reason: None,
        allocation_before,
        allocation_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_6_daily_cap_blocks_regardless_of_everything_else() {
        let decision = evaluate_guardrails(
            TriggerDirection::Buy,
            Shares::from(5.0),
            Shares::from(0.0),
            CashValue::from(10_000.0),
            Price::from(97.0),
            CashValue::from(0.0),
            &GuardrailConfig::new(0.25, 0.75, 1.0, 2),
            2,
            0.0,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.block_reason.as_deref(), Some("daily_cap"));
    }

    #[test]
    fn buy_trims_to_max_stock_pct() {
        let decision = evaluate_guardrails(
            TriggerDirection::Buy,
            Shares::from(1000.0),
            Shares::from(0.0),
            CashValue::from(10_000.0),
            Price::from(100.0),
            CashValue::from(0.0),
            &GuardrailConfig::new(0.0, 0.5, 1.0, 10),
            0,
            0.0,
        );
        assert!(decision.allowed);
        assert!(decision.allocation_after <= 0.5 + 1e-6);
    }

    #[test]
    fn sell_without_enough_shares_is_trimmed_to_qty_held() {
        let decision = evaluate_guardrails(
            TriggerDirection::Sell,
            Shares::from(500.0),
            Shares::from(100.0),
            CashValue::from(0.0),
            Price::from(100.0),
            CashValue::from(0.0),
            &GuardrailConfig::new(0.0, 1.0, 1.0, 10),
            0,
            0.0,
        );
        assert!(decision.allowed);
        assert!(decision.trimmed_qty.value() <= 100.0);
    }

    #[test]
    fn scenario_2_sell_above_max_stock_pct_is_not_trimmed_further() {
        // Spec scenario 2: a SELL that is already moving allocation toward
        // the band is not forced to sell more just because it's still above
        // max_stock_pct afterward.
        let decision = evaluate_guardrails(
            TriggerDirection::Sell,
            Shares::from(5.0),
            Shares::from(100.0),
            CashValue::from(500.0),
            Price::from(103.0),
            CashValue::from(0.0),
            &GuardrailConfig::new(0.25, 0.75, 1.0, 10),
            0,
            0.0,
        );
        assert!(decision.allowed);
        assert!((decision.trimmed_qty.value() - 5.0).abs() < 1e-6);
        assert!(decision.allocation_after > 0.75);
        assert!((decision.allocation_after - 0.9061).abs() < 0.001);
    }

    #[test]
    fn insufficient_cash_blocks_buy_entirely() {
        let decision = evaluate_guardrails(
            TriggerDirection::Buy,
            Shares::from(5.0),
            Shares::from(0.0),
            CashValue::from(0.0),
            Price::from(97.0),
            CashValue::from(0.0),
            &GuardrailConfig::default(),
            0,
            0.0,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.block_reason.as_deref(), Some("insufficient_cash"));
    }

    #[test]
    fn allocation_trim_that_falls_below_min_notional_is_blocked() {
        // A BUY trimmed almost to nothing by the allocation band must not
        // slip through just because it rounded to a positive qty.
        let decision = evaluate_guardrails(
            TriggerDirection::Buy,
            Shares::from(1000.0),
            Shares::from(74.99),
            CashValue::from(25.01),
            Price::from(1.0),
            CashValue::from(0.0),
            &GuardrailConfig::new(0.0, 0.75, 1.0, 10),
            0,
            50.0,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.block_reason.as_deref(), Some("below_min_notional"));
    }
}
