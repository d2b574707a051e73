//! Append-only per-position event log — the authoritative audit trail (spec
//! Open Question 6: TimelineRow is a denormalised read model derived from
//! this log, not the other way round). Grounded on `BrokerLog` in
//! `src/broker/record.rs`: a flat `Vec` you only ever push to, plus small
//! query helpers.

use serde_json::Value;

use crate::domain::ids::{EventSeq, PositionId, PortfolioId, TenantId};
use crate::types::EngineDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    PriceEvent,
    AnchorSet,
    AnchorUpdated,
    AnchorReset,
    AnchorFloored,
    AnchorAdjustedDividend,
    TriggerEvaluated,
    GuardrailEvaluated,
    GuardrailBlocked,
    OrderCreated,
    OrderCancelled,
    ExecutionRecorded,
    PositionUpdated,
    DividendAccrued,
    DividendPaid,
    NoAction,
    Error,
}

#[derive(Clone, Debug)]
pub struct Event {
    pub event_id: EventSeq,
    pub position_id: PositionId,
    pub tenant_id: TenantId,
    pub portfolio_id: PortfolioId,
    pub event_type: EventType,
    pub trace_id: String,
    pub parent_event_id: Option<EventSeq>,
    pub timestamp: EngineDateTime,
    pub inputs: Value,
    pub outputs: Value,
    pub message: String,
}

/// Per-position, append-only, never mutated or deleted.
#[derive(Debug, Default)]
pub struct EventLog {
    rows: Vec<Event>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_seq: 0,
        }
    }

    /// A log that continues numbering from `next_seq`, for a caller that
    /// keeps event rows in an external repository across cycles and needs
    /// the per-position sequence to stay gap-free.
    pub fn starting_at(next_seq: u64) -> Self {
        Self {
            rows: Vec::new(),
            next_seq,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        position_id: PositionId,
        tenant_id: TenantId,
        portfolio_id: PortfolioId,
        event_type: EventType,
        trace_id: impl Into<String>,
        parent_event_id: Option<EventSeq>,
        timestamp: EngineDateTime,
        inputs: Value,
        outputs: Value,
        message: impl Into<String>,
    ) -> EventSeq {
        let event_id = EventSeq::from(self.next_seq);
        self.next_seq += 1;
        self.rows.push(Event {
            event_id,
            position_id,
            tenant_id,
            portfolio_id,
            event_type,
            trace_id: trace_id.into(),
            parent_event_id,
            timestamp,
            inputs,
            outputs,
            message: message.into(),
        });
        event_id
    }

    pub fn rows(&self) -> &[Event] {
        &self.rows
    }

    pub fn events_for_trace(&self, trace_id: &str) -> Vec<&Event> {
        self.rows.iter().filter(|e| e.trace_id == trace_id).collect()
    }

    pub fn last(&self) -> Option<&Event> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (PositionId, TenantId, PortfolioId) {
        (
            PositionId::from("pos-1"),
            TenantId::from("tenant-1"),
            PortfolioId::from("pf-1"),
        )
    }

    #[test]
    fn sequence_is_gap_free_and_ordered() {
        let (pos, tenant, pf) = ids();
        let mut log = EventLog::new();
        let now = EngineDateTime::from(0_i64);
        let first = log.record(
            pos.clone(),
            tenant.clone(),
            pf.clone(),
            EventType::PriceEvent,
            "trace-1",
            None,
            now,
            Value::Null,
            Value::Null,
            "quote received",
        );
        let second = log.record(
            pos,
            tenant,
            pf,
            EventType::TriggerEvaluated,
            "trace-1",
            Some(first),
            now,
            Value::Null,
            Value::Null,
            "trigger fired",
        );
        assert_eq!(first.value(), 0);
        assert_eq!(second.value(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn events_for_trace_filters_correctly() {
        let (pos, tenant, pf) = ids();
        let mut log = EventLog::new();
        let now = EngineDateTime::from(0_i64);
        log.record(
            pos.clone(),
            tenant.clone(),
            pf.clone(),
            EventType::PriceEvent,
            "trace-a",
            None,
            now,
            Value::Null,
            Value::Null,
            "a",
        );
        log.record(
            pos,
            tenant,
            pf,
            EventType::PriceEvent,
            "trace-b",
            None,
            now,
            Value::Null,
            Value::Null,
            "b",
        );
        assert_eq!(log.events_for_trace("trace-a").len(), 1);
    }

    #[test]
    fn starting_at_continues_the_sequence_without_a_gap() {
        let (pos, tenant, pf) = ids();
        let mut log = EventLog::starting_at(5);
        let now = EngineDateTime::from(0_i64);
        let first = log.record(
            pos,
            tenant,
            pf,
            EventType::PriceEvent,
            "trace-1",
            None,
            now,
            Value::Null,
            Value::Null,
            "quote received",
        );
        assert_eq!(first.value(), 5);
    }
}
