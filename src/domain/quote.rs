//! Market quote and related enums, grounded on `src/broker/types.rs`'s
//! `Quote` (builder-style `new` taking `impl Into<T>`).

use crate::types::{EngineDateTime, Price};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Session {
    Regular,
    Extended,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteSource {
    Live,
    Historical,
    Mock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PricePolicy {
    Mid,
    Last,
    Bid,
    Ask,
    OfficialClose,
}

#[derive(Clone, Copy, Debug)]
pub struct MarketQuote {
    pub price: Price,
    pub timestamp: EngineDateTime,
    pub bid: Option<Price>,
    pub ask: Option<Price>,
    pub session: Session,
    pub source: QuoteSource,
    pub price_policy: PricePolicy,
}

impl MarketQuote {
    pub fn new(price: impl Into<Price>, timestamp: EngineDateTime, source: QuoteSource) -> Self {
        Self {
            price: price.into(),
            timestamp,
            bid: None,
            ask: None,
            session: Session::Regular,
            source,
            price_policy: PricePolicy::Last,
        }
    }

    /// Resolves the effective price per §4.11: MID if fresh bid/ask are
    /// present, else LAST, else OFFICIAL_CLOSE. Extended-session quotes are
    /// only usable when the caller has confirmed after-hours trading is
    /// allowed; that gate lives in the live orchestrator, not here.
    pub fn effective_price(&self) -> Price {
        match (self.price_policy, self.bid, self.ask) {
            (PricePolicy::Mid, Some(bid), Some(ask)) => {
                Price::from((bid.value() + ask.value()) / 2.0)
            }
            (PricePolicy::Bid, Some(bid), _) => bid,
            (PricePolicy::Ask, _, Some(ask)) => ask,
            _ => self.price,
        }
    }
}
