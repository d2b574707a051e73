//! Dividend lifecycle entities. Grounded on `Dividend`/`DividendPayment` in
//! `src/broker/mod.rs`.

use crate::domain::ids::{DividendId, PositionId, ReceivableId};
use crate::types::{CashValue, EngineDateTime, Pct, Shares};

#[derive(Clone, Debug)]
pub struct Dividend {
    pub dividend_id: DividendId,
    pub ticker: String,
    pub ex_date: EngineDateTime,
    pub pay_date: EngineDateTime,
    pub dps: f64,
    pub currency: String,
    pub withholding_tax_rate: Pct,
}

impl Dividend {
    pub fn validate(&self) -> Result<(), String> {
        let rate = self.withholding_tax_rate.value();
        if !(0.0..=1.0).contains(&rate) {
            return Err(format!("withholding_tax_rate {rate} outside [0,1]"));
        }
        if self.dps <= 0.0 {
            return Err(format!("dps {} must be positive", self.dps));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceivableStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct DividendReceivable {
    pub receivable_id: ReceivableId,
    pub position_id: PositionId,
    pub dividend_id: DividendId,
    pub shares_at_record: Shares,
    pub gross_amount: CashValue,
    pub withholding_tax: CashValue,
    pub net_amount: CashValue,
    pub status: ReceivableStatus,
    pub created_at: EngineDateTime,
    pub paid_at: Option<EngineDateTime>,
}

impl DividendReceivable {
    pub fn accrue(
        receivable_id: ReceivableId,
        position_id: PositionId,
        dividend_id: DividendId,
        shares_at_record: Shares,
        dps: f64,
        withholding_tax_rate: Pct,
        created_at: EngineDateTime,
    ) -> Self {
        let gross = shares_at_record.value() * dps;
        let tax = gross * withholding_tax_rate.value();
        let net = gross - tax;
        Self {
            receivable_id,
            position_id,
            dividend_id,
            shares_at_record,
            gross_amount: CashValue::from(gross),
            withholding_tax: CashValue::from(tax),
            net_amount: CashValue::from(net),
            status: ReceivableStatus::Pending,
            created_at,
            paid_at: None,
        }
    }

    pub fn mark_paid(&mut self, at: EngineDateTime) {
        self.status = ReceivableStatus::Paid;
        self.paid_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrue_splits_gross_into_tax_and_net() {
        let receivable = DividendReceivable::accrue(
            ReceivableId::from("r1"),
            PositionId::from("p1"),
            DividendId::from("d1"),
            Shares::from(100.0),
            2.0,
            Pct::from(0.25),
            EngineDateTime::from(0_i64),
        );
        assert_eq!(receivable.gross_amount.value(), 200.0);
        assert_eq!(receivable.withholding_tax.value(), 50.0);
        assert_eq!(receivable.net_amount.value(), 150.0);
        assert_eq!(receivable.status, ReceivableStatus::Pending);
    }

    #[test]
    fn dividend_rejects_withholding_rate_outside_unit_interval() {
        let dividend = Dividend {
            dividend_id: DividendId::from("d1"),
            ticker: "ACME".into(),
            ex_date: EngineDateTime::from(0_i64),
            pay_date: EngineDateTime::from(1_i64),
            dps: 2.0,
            currency: "USD".into(),
            withholding_tax_rate: Pct::from(1.5),
        };
        assert!(dividend.validate().is_err());
    }
}
