pub mod config;
pub mod ids;
pub mod quote;

pub use config::{GuardrailConfig, OrderPolicy, OrderSizingStrategy, TriggerConfig};
pub use ids::{DividendId, EventSeq, OrderId, PortfolioId, PositionId, ReceivableId, TenantId, TradeId};
pub use quote::{MarketQuote, PricePolicy, QuoteSource, Session};
