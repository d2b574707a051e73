//! Pure price-trigger evaluation. Grounded on `BrokerCost::calc` in
//! `src/broker/types.rs`: a pure function from inputs to a decision struct,
//! no side effects, trivially unit tested.

use crate::domain::config::TriggerConfig;
use crate::types::Price;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerDirection {
    Buy,
    Sell,
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TriggerDecision {
    pub fired: bool,
    pub direction: TriggerDirection,
    pub pct_change: f64,
    pub reason: String,
}

/// `pct_change = (current - anchor) / anchor`. Fires BUY when the drop meets
/// or exceeds `down_threshold_pct`, SELL when the rise meets or exceeds
/// `up_threshold_pct` (threshold is inclusive on both sides).
pub fn evaluate_trigger(
    config: &TriggerConfig,
    anchor_price: Option<Price>,
    current_price: Price,
) -> TriggerDecision {
    let Some(anchor) = anchor_price else {
        return TriggerDecision {
            fired: false,
            direction: TriggerDirection::None,
            pct_change: 0.0,
            reason: "anchor_unarmed".to_string(),
        };
    };

    let pct_change = (current_price.value() - anchor.value()) / anchor.value();

    if pct_change <= -config.down_threshold_pct.value() {
        TriggerDecision {
            fired: true,
            direction: TriggerDirection::Buy,
            pct_change,
            reason: "down_threshold_breached".to_string(),
        }
    } else if pct_change >= config.up_threshold_pct.value() {
        TriggerDecision {
            fired: true,
            direction: TriggerDirection::Sell,
            pct_change,
            reason: "up_threshold_breached".to_string(),
        }
    } else {
        TriggerDecision {
            fired: false,
            direction: TriggerDirection::None,
            pct_change,
            reason: "within_band".to_string(),
        }
    }
}

const SELF_HEAL_GAP: f64 = 0.50;

/// Performed by EvaluatePosition before calling `evaluate_trigger`. Returns
/// `Some(new_anchor)` if the gap exceeded 50% and the anchor should be reset
/// (the cycle that triggers this must return NO_ACTION, never a trade).
pub fn self_heal_anchor(anchor_price: Option<Price>, current_price: Price) -> Option<Price> {
    let anchor = anchor_price?;
    let pct_change = (current_price.value() - anchor.value()) / anchor.value();
    if pct_change.abs() > SELF_HEAL_GAP {
        Some(current_price)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TriggerConfig {
        TriggerConfig::new(0.03, 0.03)
    }

    #[test]
    fn scenario_1_buy_trigger_fires_on_down_move() {
        let decision = evaluate_trigger(&config(), Some(Price::from(100.0)), Price::from(97.0));
        assert!(decision.fired);
        assert_eq!(decision.direction, TriggerDirection::Buy);
        assert!((decision.pct_change - (-0.03)).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_inclusive() {
        let decision = evaluate_trigger(&config(), Some(Price::from(100.0)), Price::from(103.0));
        assert!(decision.fired);
        assert_eq!(decision.direction, TriggerDirection::Sell);
    }

    #[test]
    fn price_exactly_at_anchor_does_not_fire() {
        let decision = evaluate_trigger(&config(), Some(Price::from(100.0)), Price::from(100.0));
        assert!(!decision.fired);
        assert_eq!(decision.direction, TriggerDirection::None);
    }

    #[test]
    fn unarmed_anchor_never_fires() {
        let decision = evaluate_trigger(&config(), None, Price::from(50.0));
        assert!(!decision.fired);
        assert_eq!(decision.reason, "anchor_unarmed");
    }

    #[test]
    fn scenario_5_self_heal_on_large_gap() {
        let reset = self_heal_anchor(Some(Price::from(100.0)), Price::from(200.0));
        assert_eq!(reset, Some(Price::from(200.0)));
    }

    #[test]
    fn self_heal_does_not_trigger_under_the_gap_threshold() {
        let reset = self_heal_anchor(Some(Price::from(100.0)), Price::from(140.0));
        assert_eq!(reset, None);
    }
}
