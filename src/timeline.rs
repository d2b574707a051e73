//! Denormalised per-cycle read model. Never consulted by business logic —
//! the event log is authoritative (spec Open Question 6). Refreshed from the
//! events a cycle produces, the way `PortfolioPerformance` is kept as a
//! derived series rather than a source of truth.

use crate::domain::ids::PositionId;
use crate::types::{CashValue, EngineDateTime, Price, Shares};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionTaken {
    None,
    OrderExecuted,
    Blocked,
}

#[derive(Clone, Debug)]
pub struct TimelineRow {
    pub position_id: PositionId,
    pub trace_id: String,
    pub timestamp: EngineDateTime,
    pub pre_qty: Shares,
    pub post_qty: Shares,
    pub pre_cash: CashValue,
    pub post_cash: CashValue,
    pub effective_price: Price,
    pub anchor_price: Option<Price>,
    pub trigger_fired: bool,
    pub allocation_before: Option<f64>,
    pub allocation_after: Option<f64>,
    pub action_taken: ActionTaken,
    pub reason: String,
}
