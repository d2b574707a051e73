//! Immutable configuration blocks, resolved through a hierarchical
//! `ConfigStore` (tenant+asset -> tenant -> global). Plain structs, no
//! reflection-based merging, matching the preference shown by `BrokerCost`/
//! `StrategySnapshot` for explicit structs over dict-like config objects.

use crate::types::Pct;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerConfig {
    pub up_threshold_pct: Pct,
    pub down_threshold_pct: Pct,
}

impl TriggerConfig {
    pub fn new(up_threshold_pct: f64, down_threshold_pct: f64) -> Self {
        Self {
            up_threshold_pct: up_threshold_pct.into(),
            down_threshold_pct: down_threshold_pct.into(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::new(0.03, 0.03)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuardrailConfig {
    pub min_stock_pct: Pct,
    pub max_stock_pct: Pct,
    pub max_trade_pct_of_position: Pct,
    pub max_orders_per_day: u32,
    pub lot_size: f64,
    pub qty_step: f64,
}

impl GuardrailConfig {
    pub fn new(
        min_stock_pct: f64,
        max_stock_pct: f64,
        max_trade_pct_of_position: f64,
        max_orders_per_day: u32,
    ) -> Self {
        Self {
            min_stock_pct: min_stock_pct.into(),
            max_stock_pct: max_stock_pct.into(),
            max_trade_pct_of_position: max_trade_pct_of_position.into(),
            max_orders_per_day,
            lot_size: 0.0,
            qty_step: 0.0001,
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self::new(0.25, 0.75, 1.0, 5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderSizingStrategy {
    Proportional,
    FixedPercentage,
    Original,
}

impl Default for OrderSizingStrategy {
    fn default() -> Self {
        OrderSizingStrategy::Proportional
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderPolicy {
    pub rebalance_ratio: f64,
    pub commission_rate: Pct,
    pub min_notional: f64,
    pub allow_after_hours: bool,
    pub order_sizing_strategy: OrderSizingStrategy,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            rebalance_ratio: 1.6667,
            commission_rate: 0.0001.into(),
            min_notional: 0.0,
            allow_after_hours: false,
            order_sizing_strategy: OrderSizingStrategy::Proportional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_policy_uses_the_precise_rebalance_ratio() {
        // Open Question 5: pick 1.6667 over 1.667, document it. See DESIGN.md.
        assert_eq!(OrderPolicy::default().rebalance_ratio, 1.6667);
    }
}
