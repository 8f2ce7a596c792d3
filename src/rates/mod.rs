/// Exchange API response schema
pub mod api;

/// Rate check orchestration
pub mod monitor;

pub use api::{CurrencyRecord, ExchangeFeed, RateQuote};
pub use monitor::{CheckOutcome, RateMonitor};
