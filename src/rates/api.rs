use serde::Deserialize;

/// Top-level exchange API response
///
/// The feed must contain a `data` list of currency records; any other
/// shape is a structural error surfaced by the monitor.
#[derive(Debug, Deserialize)]
pub struct ExchangeFeed {
    pub data: Vec<CurrencyRecord>,
}

/// One currency entry in the exchange feed
///
/// Only the currency code and the buy rate are read; the feed carries
/// many other fields that are ignored.
#[derive(Debug, Deserialize)]
pub struct CurrencyRecord {
    #[serde(rename = "CurrCode")]
    pub currency_code: String,

    /// The feed serves this field as either a JSON number or a string
    #[serde(rename = "TTBUY", default)]
    pub buy_rate: Option<RateField>,
}

/// A rate value that may arrive as a JSON number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RateField {
    Number(f64),
    Text(String),
}

impl RateField {
    /// Interpret the field as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RateField::Number(n) => Some(*n),
            RateField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A parsed buy-rate quote for one currency
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub currency_code: String,
    pub buy_rate: f64,
}

impl CurrencyRecord {
    /// Parse this record into a quote, if its buy rate is numeric
    pub fn quote(&self) -> Option<RateQuote> {
        let buy_rate = self.buy_rate.as_ref()?.as_f64()?;
        Some(RateQuote {
            currency_code: self.currency_code.clone(),
            buy_rate,
        })
    }
}
