//! Historical replay driver. Grounded on `SimContext`/`Clock`/`ClockBuilder`
//! (`src/simcontext/mod.rs`, `src/clock/mod.rs`) for bar-by-bar replay, and
//! `PortfolioPerformance` (`src/perf/mod.rs`) for the return/benchmark
//! output. Owns fully isolated in-memory stores per run — no read or write
//! to live stores from this path (spec §4.12).

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::domain::ids::{DividendId, PositionId, ReceivableId, TradeId};
use crate::domain::quote::{MarketQuote, QuoteSource, Session};
use crate::errors::EngineResult;
use crate::event::EventLog;
use crate::infra::historical::Historian;
use crate::infra::memory::InMemoryConfigStore;
use crate::infra::memory::{
    InMemoryIdempotencyStore, InMemoryOrderRepository, InMemoryTimelineRepository,
    InMemoryTradeRepository,
};
use crate::ports::{OhlcvBar, TradeRepository};
use crate::timeline::TimelineRow;
use crate::position::Position;
use crate::trade::Trade;
use crate::types::{EngineDateTime, Price};
use crate::usecases::dividend_usecase::DividendUseCase;
use crate::usecases::evaluate_position::EvaluatePositionUseCase;
use crate::usecases::execute_order::ExecuteOrderUseCase;
use crate::usecases::submit_order::SubmitOrderUseCase;

/// Which part of the bar to synthesise a `MarketQuote` from. Close is the
/// spec's default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarPriceField {
    Open,
    Close,
    High,
    Low,
}

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub price_field: BarPriceField,
    pub extended_hours: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            price_field: BarPriceField::Close,
            extended_hours: false,
        }
    }
}

pub struct SimulationResult {
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_qty: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub buy_and_hold_return: f64,
    pub trades: Vec<Trade>,
    pub daily_pnl: Vec<f64>,
    pub events: EventLog,
    pub timeline: Vec<TimelineRow>,
}

/// A simulation run owns its own isolated `InMemoryOrderRepository` /
/// `InMemoryIdempotencyStore` / `InMemoryConfigStore` and `EventLog` —
/// freshly constructed per run, never shared with the live orchestrator, so
/// isolation is enforced at the type level rather than by a runtime tenant
/// check.
pub struct SimulationOrchestrator {
    config: SimulationConfig,
}

impl SimulationOrchestrator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    fn bar_price(&self, bar: &OhlcvBar) -> f64 {
        match self.config.price_field {
            BarPriceField::Open => bar.open,
            BarPriceField::Close => bar.close,
            BarPriceField::High => bar.high,
            BarPriceField::Low => bar.low,
        }
    }

    /// Replays `historian`'s bars for `position.asset_symbol` between
    /// `start` and `end`, running the dividend use-case on any ex-dates
    /// before that day's first bar (spec Open Question 4), then invoking
    /// EvaluatePosition in auto-execute mode for every bar.
    pub fn run(
        &self,
        mut position: Position,
        historian: &Historian,
        start: EngineDateTime,
        end: EngineDateTime,
    ) -> EngineResult<SimulationResult> {
        let orders = InMemoryOrderRepository::new();
        let idempotency = InMemoryIdempotencyStore::new();
        let config_store = InMemoryConfigStore::new();
        let trades_repo = InMemoryTradeRepository::new();
        let timeline_repo = InMemoryTimelineRepository::new();
        let dividend_use_case = DividendUseCase;

        let mut events = EventLog::new();
        let initial_cash = position.cash.value();

        let bars = historian.get_historical_bars(&position.asset_symbol, start, end)?;
        let dividends = historian.get_dividends(&position.asset_symbol, start, end)?;
        let initial_price = bars.first().map(|b| self.bar_price(b)).unwrap_or(0.0);

        let mut trade_seq: u64 = 0;
        let mut receivable_seq: u64 = 0;
        let mut daily_pnl = Vec::with_capacity(bars.len());
        let mut last_value = initial_cash + position.qty.value() * initial_price;

        let mut dividend_idx = 0;
        let mut last_day_processed: Option<i64> = None;

        for bar in &bars {
            let day = bar.timestamp.epoch_secs() - bar.timestamp.epoch_secs().rem_euclid(86_400);
            if last_day_processed != Some(day) {
                while dividend_idx < dividends.len()
                    && dividends[dividend_idx].ex_date.epoch_secs() >= day
                    && dividends[dividend_idx].ex_date.epoch_secs() < day + 86_400
                {
                    let dividend = &dividends[dividend_idx];
                    receivable_seq += 1;
                    let receivable_id = ReceivableId::from(format!("sim-receivable-{receivable_seq}"));
                    let mut receivable = dividend_use_case.process_ex_dividend_date(
                        &mut position,
                        dividend,
                        || receivable_id,
                        &format!("sim-dividend-{receivable_seq}"),
                        &mut events,
                    )?;
                    // Pay-date processing is driven by the bar loop below;
                    // if pay_date already elapsed in this window, settle now.
                    if dividend.pay_date.epoch_secs() <= end.epoch_secs() {
                        dividend_use_case.process_dividend_payment(
                            &mut position,
                            &mut receivable,
                            dividend.pay_date,
                            &format!("sim-dividend-pay-{receivable_seq}"),
                            &mut events,
                        )?;
                    }
                    dividend_idx += 1;
                }
                last_day_processed = Some(day);
            }

            let price = self.bar_price(bar);
            let quote = MarketQuote {
                price: Price::from(price),
                timestamp: bar.timestamp,
                bid: None,
                ask: None,
                session: if self.config.extended_hours {
                    Session::Extended
                } else {
                    Session::Regular
                },
                source: QuoteSource::Historical,
                price_policy: crate::domain::quote::PricePolicy::Last,
            };

            let submit_order = SubmitOrderUseCase {
                orders: &orders,
                idempotency: &idempotency,
                config: &config_store,
            };
            let use_case = EvaluatePositionUseCase {
                submit_order,
                execute_order: ExecuteOrderUseCase,
                trades: &trades_repo,
                timeline: &timeline_repo,
            };

            let orders_today = orders.orders_today(&position.position_id, bar.timestamp)?;
            let bar_seq = trade_seq;
            trade_seq += 1;
            let trace_id = format!("sim-{}-{}", position.position_id, bar_seq);

            use_case.execute(
                &mut position,
                quote,
                trace_id,
                orders_today,
                true,
                &mut events,
                move || TradeId::from(format!("sim-trade-{bar_seq}")),
            )?;

            let value = position.cash.value() + position.qty.value() * price;
            daily_pnl.push(value - last_value);
            last_value = value;
        }

        let final_price = bars.last().map(|b| self.bar_price(b)).unwrap_or(initial_price);
        let final_value = position.cash.value() + position.qty.value() * final_price;
        let total_return = if initial_cash.abs() > f64::EPSILON {
            (final_value - initial_cash) / initial_cash
        } else {
            0.0
        };

        let buy_and_hold_shares = if initial_price.abs() > f64::EPSILON {
            initial_cash / initial_price
        } else {
            0.0
        };
        let buy_and_hold_final = buy_and_hold_shares * final_price;
        let buy_and_hold_return = if initial_cash.abs() > f64::EPSILON {
            (buy_and_hold_final - initial_cash) / initial_cash
        } else {
            0.0
        };

        info!(
            "SIM: run complete for {} total_return={:.4} buy_and_hold={:.4}",
            position.position_id, total_return, buy_and_hold_return
        );

        let trades = trades_repo.list_for_position(&position.position_id)?;

        Ok(SimulationResult {
            initial_cash,
            final_cash: position.cash.value(),
            final_qty: position.qty.value(),
            final_value,
            total_return,
            buy_and_hold_return,
            trades,
            daily_pnl,
            events,
            timeline: timeline_repo.rows(),
        })
    }
}

/// Shared clock primitive for replay-driven contexts that want an
/// externally steppable cursor instead of iterating a `Vec` directly,
/// grounded on `Clock`/`ClockInner` in `src/clock/mod.rs`.
#[derive(Clone)]
pub struct ReplayClock(Rc<RefCell<ReplayClockInner>>);

struct ReplayClockInner {
    dates: Vec<EngineDateTime>,
    pos: usize,
}

impl ReplayClock {
    pub fn from_dates(dates: Vec<EngineDateTime>) -> Self {
        Self(Rc::new(RefCell::new(ReplayClockInner { dates, pos: 0 })))
    }

    pub fn now(&self) -> EngineDateTime {
        let inner = self.0.borrow();
        inner.dates[inner.pos]
    }

    pub fn has_next(&self) -> bool {
        let inner = self.0.borrow();
        inner.pos + 1 < inner.dates.len()
    }

    pub fn tick(&self) {
        let mut inner = self.0.borrow_mut();
        inner.pos += 1;
    }
}
