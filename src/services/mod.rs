pub mod guardrail;
pub mod sizing;
pub mod trigger;

pub use guardrail::{evaluate_guardrails, GuardrailDecision};
pub use sizing::{compute_sizing, SizingDecision};
pub use trigger::{evaluate_trigger, self_heal_anchor, TriggerDecision, TriggerDirection};
