//! Historical bar storage and a synthetic mock quote source, grounded on
//! `Penelope` in `src/input/penelope.rs`: a date-ordered map keyed by
//! timestamp, with `add_quote`/`from_binance`-style CSV ingestion and a
//! `random`-style synthetic path generator.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_distr::Uniform;
use serde::Deserialize;

use crate::dividend::Dividend;
use crate::domain::ids::DividendId;
use crate::domain::quote::QuoteSource;
use crate::errors::{EngineError, EngineResult};
use crate::ports::{MarketDataProvider, OhlcvBar};
use crate::types::EngineDateTime;

#[derive(Debug, Deserialize)]
pub struct CsvBarRecord {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A date-ordered, ticker-keyed store of historical bars. `Historian` plays
/// the role `Penelope` plays for `SimulatedBroker`: the read-only data feed
/// the simulation orchestrator steps through bar by bar.
#[derive(Default)]
pub struct Historian {
    bars: BTreeMap<i64, Vec<(String, OhlcvBar)>>,
    dividends: Vec<(String, Dividend)>,
}

impl Historian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bar(&mut self, ticker: &str, bar: OhlcvBar) {
        self.bars
            .entry(bar.timestamp.epoch_secs())
            .or_default()
            .push((ticker.to_string(), bar));
    }

    pub fn add_dividend(&mut self, ticker: &str, dividend: Dividend) {
        self.dividends.push((ticker.to_string(), dividend));
    }

    /// Loads bars from CSV records in `from_binance`'s style: parse each
    /// row, convert the date column, and insert.
    pub fn load_csv_records(
        &mut self,
        ticker: &str,
        records: Vec<CsvBarRecord>,
        date_fmt: &str,
    ) -> EngineResult<()> {
        for record in records {
            let timestamp = EngineDateTime::from_date_string(&record.date, date_fmt);
            self.add_bar(
                ticker,
                OhlcvBar {
                    timestamp,
                    open: record.open,
                    high: record.high,
                    low: record.low,
                    close: record.close,
                    volume: record.volume,
                },
            );
        }
        Ok(())
    }

    /// Reads a CSV file of `date,open,high,low,close,volume` rows.
    pub fn load_csv_file(
        &mut self,
        ticker: &str,
        path: &std::path::Path,
        date_fmt: &str,
    ) -> EngineResult<()> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| EngineError::MarketDataError(e.to_string()))?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: CsvBarRecord =
                result.map_err(|e| EngineError::MarketDataError(e.to_string()))?;
            records.push(record);
        }
        self.load_csv_records(ticker, records, date_fmt)
    }

    /// Generates a synthetic daily random-walk price path, grounded on
    /// `Penelope::random`'s `rand_distr::Uniform`-based generator.
    pub fn generate_random_walk(
        &mut self,
        ticker: &str,
        start: EngineDateTime,
        days: u32,
        starting_price: f64,
        daily_vol_pct: f64,
        rng: &mut impl Rng,
    ) {
        let dist = Uniform::new(-daily_vol_pct, daily_vol_pct);
        let mut price = starting_price;
        for day in 0..days {
            let pct_move: f64 = dist.sample(rng);
            let open = price;
            price = (price * (1.0 + pct_move)).max(0.01);
            let timestamp = EngineDateTime::from(start.epoch_secs() + i64::from(day) * 86_400);
            self.add_bar(
                ticker,
                OhlcvBar {
                    timestamp,
                    open,
                    high: open.max(price),
                    low: open.min(price),
                    close: price,
                    volume: 0.0,
                },
            );
        }
    }

    pub fn bars_for(&self, ticker: &str, start: EngineDateTime, end: EngineDateTime) -> Vec<OhlcvBar> {
        self.bars
            .range(start.epoch_secs()..=end.epoch_secs())
            .flat_map(|(_, rows)| rows.iter())
            .filter(|(t, _)| t == ticker)
            .map(|(_, bar)| *bar)
            .collect()
    }
}

impl MarketDataProvider for Historian {
    fn get_latest_quote(&self, ticker: &str) -> EngineResult<crate::domain::quote::MarketQuote> {
        let (_, bar) = self
            .bars
            .values()
            .flat_map(|rows| rows.iter())
            .filter(|(t, _)| t == ticker)
            .next_back()
            .ok_or_else(|| EngineError::MarketDataError(format!("no bars loaded for {ticker}")))?;
        Ok(crate::domain::quote::MarketQuote::new(
            bar.close,
            bar.timestamp,
            QuoteSource::Historical,
        ))
    }

    fn get_historical_bars(
        &self,
        ticker: &str,
        start: EngineDateTime,
        end: EngineDateTime,
    ) -> EngineResult<Vec<OhlcvBar>> {
        Ok(self.bars_for(ticker, start, end))
    }

    fn get_dividends(
        &self,
        ticker: &str,
        start: EngineDateTime,
        end: EngineDateTime,
    ) -> EngineResult<Vec<Dividend>> {
        Ok(self
            .dividends
            .iter()
            .filter(|(t, d)| {
                t == ticker
                    && d.ex_date.epoch_secs() >= start.epoch_secs()
                    && d.ex_date.epoch_secs() <= end.epoch_secs()
            })
            .map(|(_, d)| d.clone())
            .collect())
    }

    fn source(&self) -> QuoteSource {
        QuoteSource::Historical
    }
}

/// Builds a dividend announcement for tests and demos without needing a
/// real corporate-actions feed.
pub fn mock_dividend(
    ticker: &str,
    ex_date: EngineDateTime,
    pay_date: EngineDateTime,
    dps: f64,
    withholding_tax_rate: f64,
) -> Dividend {
    Dividend {
        dividend_id: DividendId::from(format!("{ticker}-{}", ex_date.epoch_secs())),
        ticker: ticker.to_string(),
        ex_date,
        pay_date,
        dps,
        currency: "USD".to_string(),
        withholding_tax_rate: withholding_tax_rate.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_for_filters_by_ticker_and_range() {
        let mut historian = Historian::new();
        historian.add_bar(
            "ACME",
            OhlcvBar {
                timestamp: EngineDateTime::from(0_i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1000.0,
            },
        );
        historian.add_bar(
            "OTHER",
            OhlcvBar {
                timestamp: EngineDateTime::from(0_i64),
                open: 50.0,
                high: 51.0,
                low: 49.0,
                close: 50.5,
                volume: 500.0,
            },
        );
        let bars = historian.bars_for("ACME", EngineDateTime::from(0_i64), EngineDateTime::from(86_400_i64));
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 100.5);
    }

    #[test]
    fn generate_random_walk_produces_the_requested_number_of_bars() {
        let mut historian = Historian::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        historian.generate_random_walk(
            "ACME",
            EngineDateTime::from(0_i64),
            10,
            100.0,
            0.02,
            &mut rng,
        );
        let bars = historian.bars_for(
            "ACME",
            EngineDateTime::from(0_i64),
            EngineDateTime::from(10 * 86_400_i64),
        );
        assert_eq!(bars.len(), 10);
    }
}
