//! Pure sizing calculator: anchor-drift formula -> rounded, minimum-notional
//! checked proposal. Grounded on `BrokerCost::trade_impact` (pure
//! calculation ahead of any mutation) in `src/broker/types.rs`.

use crate::domain::config::{GuardrailConfig, OrderPolicy, OrderSizingStrategy};
use crate::services::trigger::TriggerDirection;
use crate::types::{CashValue, Price, Shares};

#[derive(Clone, Debug, PartialEq)]
pub struct SizingDecision {
    pub side: TriggerDirection,
    pub qty: Shares,
    pub no_action: bool,
    pub reason: String,
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

/// `direction` is the trigger's direction; `current_price` / `anchor_price`
/// are as observed this cycle; `qty` and `effective_cash` are the position's
/// current state.
pub fn compute_sizing(
    direction: TriggerDirection,
    current_price: Price,
    anchor_price: Price,
    qty: Shares,
    effective_cash: CashValue,
    policy: &OrderPolicy,
    guardrail: &GuardrailConfig,
) -> SizingDecision {
    let p = current_price.value();
    let p_anchor = anchor_price.value();
    let q = qty.value();
    let c = effective_cash.value();
    let r = policy.rebalance_ratio;

    let raw_qty = match policy.order_sizing_strategy {
        OrderSizingStrategy::Proportional => {
            let delta = (p_anchor / p - 1.0) * r * (c + q * p) / p;
            delta.abs()
        }
        OrderSizingStrategy::FixedPercentage => match direction {
            TriggerDirection::Buy => (c * r) / p,
            TriggerDirection::Sell => q * r,
            TriggerDirection::None => 0.0,
        },
        OrderSizingStrategy::Original => {
            let delta = (p_anchor / p) * r * (c + q * p) / p;
            delta.abs()
        }
    };

    let rounded = round_to_step(raw_qty, guardrail.qty_step, guardrail.lot_size);

    if rounded <= 0.0 {
        return SizingDecision {
            side: direction,
            qty: Shares::from(0.0),
            no_action: true,
            reason: "below_lot".to_string(),
        };
    }

    if rounded * p < policy.min_notional {
        return SizingDecision {
            side: direction,
            qty: Shares::from(0.0),
            no_action: true,
            reason: "below_min_notional".to_string(),
        };
    }

    SizingDecision {
        side: direction,
        qty: Shares::from(rounded),
        no_action: false,
        reason: "sized".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_1_proportional_buy_matches_spec_math() {
        let decision = compute_sizing(
            TriggerDirection::Buy,
            Price::from(97.0),
            Price::from(100.0),
            Shares::from(0.0),
            CashValue::from(10_000.0),
            &OrderPolicy::default(),
            &GuardrailConfig {
                qty_step: 0.0001,
                lot_size: 0.0,
                ..GuardrailConfig::default()
            },
        );
        assert!(!decision.no_action);
        assert!((decision.qty.value() - 5.313).abs() < 1e-2);
    }

    #[test]
    fn zero_after_rounding_returns_no_action_below_lot() {
        let decision = compute_sizing(
            TriggerDirection::Buy,
            Price::from(100.0001),
            Price::from(100.0),
            Shares::from(0.0),
            CashValue::from(0.0001),
            &OrderPolicy::default(),
            &GuardrailConfig::default(),
        );
        assert!(decision.no_action);
        assert_eq!(decision.reason, "below_lot");
    }

    #[test]
    fn below_min_notional_blocks_even_with_nonzero_qty() {
        let mut policy = OrderPolicy::default();
        policy.min_notional = 1_000_000.0;
        let decision = compute_sizing(
            TriggerDirection::Buy,
            Price::from(97.0),
            Price::from(100.0),
            Shares::from(0.0),
            CashValue::from(10_000.0),
            &policy,
            &GuardrailConfig::default(),
        );
        assert!(decision.no_action);
        assert_eq!(decision.reason, "below_min_notional");
    }

    #[test]
    fn fixed_percentage_sell_is_qty_times_ratio() {
        let mut policy = OrderPolicy::default();
        policy.order_sizing_strategy = OrderSizingStrategy::FixedPercentage;
        policy.rebalance_ratio = 0.1;
        let decision = compute_sizing(
            TriggerDirection::Sell,
            Price::from(103.0),
            Price::from(100.0),
            Shares::from(100.0),
            CashValue::from(500.0),
            &policy,
            &GuardrailConfig::default(),
        );
        assert!((decision.qty.value() - 10.0).abs() < 1e-6);
    }
}
