//! # What is this?
//!
//! A deterministic volatility-rebalancing engine for self-contained equity
//! position cells. Each position tracks one asset against one cash balance
//! with a mutable "anchor" price: when the asset's price moves away from the
//! anchor past a configured threshold, the position sizes and submits a
//! rebalancing order back towards its target allocation, subject to a fixed
//! set of guardrails (daily order caps, allocation bounds, trade-size caps).
//!
//! The engine is deliberately narrow. It has no notion of a multi-asset
//! portfolio optimizer, no signal generation, and no broker integration
//! beyond the [ports::BrokerAdapter] trait boundary. It answers one
//! question, repeatedly, for one position at a time: given the position's
//! current state and a new quote, what (if anything) should happen next.
//!
//! # How it's organised
//!
//! - [position] holds the `Position` aggregate: qty, cash, anchor price, and
//!   per-position config overrides.
//! - [services] contains the pure decision functions: `evaluate_trigger`,
//!   `compute_sizing`, `evaluate_guardrails`. None of these touch I/O or
//!   mutate anything; they take values in and return decisions out.
//! - [usecases] wires the pure services together with persistence: submit an
//!   order, execute a fill, process a dividend, and the top-level conductor
//!   that runs one full evaluation cycle for a position.
//! - [ports] defines the traits the use-cases depend on (repositories,
//!   market data, broker adapters, idempotency) so that [infra]'s in-memory
//!   and historical-replay implementations can be swapped for production
//!   ones without touching use-case code.
//! - [orchestrator] drives use-cases over time: [orchestrator::live] polls
//!   positions on an interval against live market data, and
//!   [orchestrator::simulation] replays historical bars with fully isolated
//!   per-run stores.
//!
//! # Determinism
//!
//! Every decision a position makes is a pure function of its stored state
//! and the quote it's given. Two runs fed the same sequence of quotes
//! produce the same sequence of orders, fills, and anchor updates — this is
//! what makes the simulation orchestrator's replay trustworthy as a
//! predictor of live behaviour.

pub mod dividend;
pub mod domain;
pub mod errors;
pub mod event;
pub mod infra;
pub mod order;
pub mod orchestrator;
pub mod ports;
pub mod position;
pub mod services;
pub mod timeline;
pub mod trade;
pub mod types;
pub mod usecases;

pub use errors::{EngineError, EngineResult};
pub use position::Position;
