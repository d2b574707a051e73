//! Caller-visible error taxonomy (spec §7). Pure services never error: they
//! return decision structs with a reason field. `EngineError` is raised only
//! by use-cases and repositories. Programming errors (invariant violations)
//! stay as `panic!`/`debug_assert!`, mirroring `SimulatedBroker`'s split
//! between panics on invalid `ready_state` transitions and its
//! `Result`-returning domain checks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("position not found: {0}")]
    PositionNotFound(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("order {0} is not in submitted state")]
    OrderNotSubmitted(String),

    #[error("idempotency conflict for key {0}")]
    IdempotencyConflict(String),

    #[error("guardrail breach: {0}")]
    GuardrailBreach(String),

    #[error("dividend receivable not found: {0}")]
    ReceivableNotFound(String),

    #[error("invalid dividend announcement: {0}")]
    InvalidDividend(String),

    #[error("insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("market data provider error: {0}")]
    MarketDataError(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("external call timed out: {0}")]
    Timeout(String),

    #[error("data inconsistency: {0}")]
    DataInconsistency(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
