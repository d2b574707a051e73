//! Generic value types shared across the engine.
//!
//! Newtypes around `f64`/`i64` so that cash, price, share quantities and
//! timestamps can't be mixed up at call sites. Follows `src/types/mod.rs`'s
//! hand-rolled `Deref`/`From` style rather than pulling in a derive crate for
//! it.

use std::ops::{Add, AddAssign, Sub, SubAssign};
use time::{format_description, Date, OffsetDateTime};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct CashValue(f64);

impl CashValue {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for CashValue {
    fn from(v: f64) -> Self {
        CashValue(v)
    }
}

impl From<CashValue> for f64 {
    fn from(v: CashValue) -> Self {
        v.0
    }
}

impl Add for CashValue {
    type Output = CashValue;
    fn add(self, rhs: CashValue) -> Self::Output {
        CashValue(self.0 + rhs.0)
    }
}

impl Sub for CashValue {
    type Output = CashValue;
    fn sub(self, rhs: CashValue) -> Self::Output {
        CashValue(self.0 - rhs.0)
    }
}

impl AddAssign for CashValue {
    fn add_assign(&mut self, rhs: CashValue) {
        self.0 += rhs.0;
    }
}

impl SubAssign for CashValue {
    fn sub_assign(&mut self, rhs: CashValue) {
        self.0 -= rhs.0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Shares(f64);

impl Shares {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.abs() < 1e-9
    }
}

impl From<f64> for Shares {
    fn from(v: f64) -> Self {
        Shares(v)
    }
}

impl From<Shares> for f64 {
    fn from(v: Shares) -> Self {
        v.0
    }
}

impl Add for Shares {
    type Output = Shares;
    fn add(self, rhs: Shares) -> Self::Output {
        Shares(self.0 + rhs.0)
    }
}

impl Sub for Shares {
    type Output = Shares;
    fn sub(self, rhs: Shares) -> Self::Output {
        Shares(self.0 - rhs.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Price {
    fn from(v: f64) -> Self {
        Price(v)
    }
}

impl From<Price> for f64 {
    fn from(v: Price) -> Self {
        v.0
    }
}

/// A fraction used for thresholds, rates and allocation bands (e.g. 0.03 == 3%).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Pct(f64);

impl Pct {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Pct {
    fn from(v: f64) -> Self {
        Pct(v)
    }
}

impl From<Pct> for f64 {
    fn from(v: Pct) -> Self {
        v.0
    }
}

pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<time::Weekday> for Weekday {
    fn from(v: time::Weekday) -> Self {
        match v {
            time::Weekday::Monday => Weekday::Monday,
            time::Weekday::Tuesday => Weekday::Tuesday,
            time::Weekday::Wednesday => Weekday::Wednesday,
            time::Weekday::Thursday => Weekday::Thursday,
            time::Weekday::Friday => Weekday::Friday,
            time::Weekday::Saturday => Weekday::Saturday,
            time::Weekday::Sunday => Weekday::Sunday,
        }
    }
}

/// Wrapper around a unix timestamp (seconds). Keeps the `time` crate's API out
/// of the rest of the engine so it could be swapped later without touching
/// call sites.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct EngineDateTime(i64);

impl EngineDateTime {
    pub fn weekday(&self) -> Weekday {
        let date: OffsetDateTime = (*self).into();
        date.weekday().into()
    }

    pub fn day(&self) -> u8 {
        let date: OffsetDateTime = (*self).into();
        date.day()
    }

    pub fn from_date_string(val: &str, date_fmt: &str) -> Self {
        let format = format_description::parse(date_fmt).expect("valid date format");
        let parsed_date = Date::parse(val, &format).expect("parseable date");
        let parsed_time = parsed_date.with_time(time::macros::time!(09:00));
        Self::from(parsed_time.assume_utc().unix_timestamp())
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0
    }
}

impl From<i64> for EngineDateTime {
    fn from(v: i64) -> Self {
        EngineDateTime(v)
    }
}

impl From<EngineDateTime> for i64 {
    fn from(v: EngineDateTime) -> Self {
        v.0
    }
}

impl From<OffsetDateTime> for EngineDateTime {
    fn from(value: OffsetDateTime) -> Self {
        value.unix_timestamp().into()
    }
}

impl From<EngineDateTime> for OffsetDateTime {
    fn from(v: EngineDateTime) -> Self {
        OffsetDateTime::from_unix_timestamp(v.0).expect("valid unix timestamp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_value_arithmetic_round_trips_through_f64() {
        let a = CashValue::from(100.0);
        let b = CashValue::from(25.5);
        assert_eq!(f64::from(a + b), 125.5);
        assert_eq!(f64::from(a - b), 74.5);
    }

    #[test]
    fn shares_is_zero_within_tolerance() {
        assert!(Shares::from(0.0).is_zero());
        assert!(Shares::from(1e-10).is_zero());
        assert!(!Shares::from(0.01).is_zero());
    }
}
