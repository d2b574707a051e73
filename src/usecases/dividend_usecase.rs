//! Ex-date accrual and pay-date settlement. Grounded on `PayDividend` /
//! `DividendPayment` handling in `src/broker/mod.rs`.

use log::info;
use serde_json::json;

use crate::dividend::{Dividend, DividendReceivable, ReceivableStatus};
use crate::domain::ids::{EventSeq, ReceivableId};
use crate::errors::{EngineError, EngineResult};
use crate::event::{EventLog, EventType};
use crate::position::Position;
use crate::types::EngineDateTime;

pub struct DividendUseCase;

impl DividendUseCase {
    /// Steps 1-6 of the ex-date procedure: snapshot shares, split gross into
    /// tax/net, accrue the receivable, adjust the anchor, log both events.
    pub fn process_ex_dividend_date(
        &self,
        position: &mut Position,
        dividend: &Dividend,
        make_receivable_id: impl FnOnce() -> ReceivableId,
        trace_id: &str,
        events: &mut EventLog,
    ) -> EngineResult<DividendReceivable> {
        dividend
            .validate()
            .map_err(EngineError::InvalidDividend)?;

        let receivable = DividendReceivable::accrue(
            make_receivable_id(),
            position.position_id.clone(),
            dividend.dividend_id.clone(),
            position.qty,
            dividend.dps,
            dividend.withholding_tax_rate,
            dividend.ex_date,
        );

        position.accrue_receivable(receivable.net_amount, dividend.ex_date);

        let accrued_event = events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::DividendAccrued,
            trace_id,
            None,
            dividend.ex_date,
            json!({"dps": dividend.dps, "shares": position.qty.value()}),
            json!({"net_amount": receivable.net_amount.value()}),
            "dividend accrued on ex-date",
        );

        let floored = position.adjust_anchor_for_dividend(dividend.dps, dividend.ex_date);

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::AnchorAdjustedDividend,
            trace_id,
            Some(accrued_event),
            dividend.ex_date,
            json!({"dps": dividend.dps}),
            json!({"anchor": position.anchor_price.map(|p| p.value())}),
            "anchor reduced by dps",
        );

        if floored {
            events.record(
                position.position_id.clone(),
                position.tenant_id.clone(),
                position.portfolio_id.clone(),
                EventType::AnchorFloored,
                trace_id,
                None,
                dividend.ex_date,
                json!({}),
                json!({"anchor": position.anchor_price.map(|p| p.value())}),
                "dividend exceeded anchor; floored at epsilon",
            );
        }

        info!(
            "DIVIDEND: accrued {} net for position {}",
            receivable.net_amount.value(),
            position.position_id
        );

        Ok(receivable)
    }

    /// Paying an already-paid receivable is a no-op that returns success —
    /// no double credit, no anchor change.
    pub fn process_dividend_payment(
        &self,
        position: &mut Position,
        receivable: &mut DividendReceivable,
        at: EngineDateTime,
        trace_id: &str,
        events: &mut EventLog,
    ) -> EngineResult<()> {
        if receivable.status == ReceivableStatus::Paid {
            return Ok(());
        }
        if receivable.status == ReceivableStatus::Cancelled {
            return Err(EngineError::DataInconsistency(format!(
                "receivable {} is cancelled, cannot pay",
                receivable.receivable_id
            )));
        }

        position
            .pay_receivable(receivable.net_amount, at)
            .map_err(EngineError::DataInconsistency)?;
        receivable.mark_paid(at);

        events.record(
            position.position_id.clone(),
            position.tenant_id.clone(),
            position.portfolio_id.clone(),
            EventType::DividendPaid,
            trace_id,
            None,
            at,
            json!({"receivable_id": receivable.receivable_id.to_string()}),
            json!({"net_amount": receivable.net_amount.value()}),
            "dividend paid",
        );

        info!(
            "DIVIDEND: paid {} to position {}",
            receivable.net_amount.value(),
            position.position_id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
    use crate::domain::ids::{DividendId, PositionId, PortfolioId, TenantId};
    use crate::types::{CashValue, Pct, Price, Shares};

    fn setup() -> Position {
        Position::new(
            TenantId::from("t1"),
            PortfolioId::from("pf1"),
            PositionId::from("pos1"),
            "ACME",
            CashValue::from(5_000.0),
            Shares::from(100.0),
            Some(Price::from(100.0)),
            TriggerConfig::default(),
            GuardrailConfig::default(),
            OrderPolicy::default(),
            EngineDateTime::from(0_i64),
        )
    }

    #[test]
    fn scenario_4_full_lifecycle() {
        let mut position = setup();
        let mut events = EventLog::new();
        let use_case = DividendUseCase;
        let dividend = Dividend {
            dividend_id: DividendId::from("d1"),
            ticker: "ACME".into(),
            ex_date: EngineDateTime::from(1_i64),
            pay_date: EngineDateTime::from(30_i64),
            dps: 2.0,
            currency: "USD".into(),
            withholding_tax_rate: Pct::from(0.25),
        };

        let mut receivable = use_case
            .process_ex_dividend_date(
                &mut position,
                &dividend,
                || ReceivableId::from("r1"),
                "trace-1",
                &mut events,
            )
            .unwrap();

        assert_eq!(position.dividend_receivable.value(), 150.0);
        assert_eq!(position.anchor_price.unwrap().value(), 98.0);

        use_case
            .process_dividend_payment(
                &mut position,
                &mut receivable,
                EngineDateTime::from(30_i64),
                "trace-2",
                &mut events,
            )
            .unwrap();

        assert_eq!(position.cash.value(), 5_150.0);
        assert_eq!(position.dividend_receivable.value(), 0.0);
        assert_eq!(position.total_dividends_received.value(), 150.0);

        // Second payment is a no-op.
        use_case
            .process_dividend_payment(
                &mut position,
                &mut receivable,
                EngineDateTime::from(31_i64),
                "trace-3",
                &mut events,
            )
            .unwrap();
        assert_eq!(position.total_dividends_received.value(), 150.0);
    }
}
