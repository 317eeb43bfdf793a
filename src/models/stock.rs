use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::quote::QuoteSnapshot;

/// One element of the persisted `stocks.json` array
///
/// `symbol` is the key and never changes once loaded. The three numeric fields
/// are only overwritten when the provider returns a market cap for the symbol.
/// Any other fields on the record (name, sector, ...) are carried through a
/// rewrite untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub symbol: String,
    #[serde(default, serialize_with = "serialize_number")]
    pub market_cap: Option<f64>,
    #[serde(default, serialize_with = "serialize_number")]
    pub price_change: Option<f64>,
    #[serde(default, serialize_with = "serialize_number")]
    pub price_change_percent: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StockRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market_cap: None,
            price_change: None,
            price_change_percent: None,
            extra: Map::new(),
        }
    }

    /// True when the record holds a positive, finite market cap
    pub fn has_valid_market_cap(&self) -> bool {
        self.market_cap.is_some_and(is_valid_market_cap)
    }

    /// Merge a provider quote into this record
    ///
    /// Returns true if the quote carried a positive market cap. A quote
    /// without a market cap leaves the record as it was.
    pub fn apply_quote(&mut self, quote: &QuoteSnapshot) -> bool {
        let Some(market_cap) = quote.market_cap else {
            return false;
        };

        self.market_cap = Some(market_cap);
        self.price_change = quote.price_change;
        self.price_change_percent = quote.price_change_percent;

        is_valid_market_cap(market_cap)
    }
}

fn is_valid_market_cap(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Largest magnitude below which every whole `f64` is an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole numbers are written without a fraction (`3000000000000`, not
/// `3000000000000.0`) so a rewrite keeps the file's existing number format
fn serialize_number<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *value {
        Some(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER => serializer.serialize_i64(v as i64),
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}
