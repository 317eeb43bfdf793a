//! Yahoo Finance quoteSummary response models
//!
//! Numeric values arrive as `{"raw": 123.4, "fmt": "123.40"}` objects, or as
//! `{}` when Yahoo has no value.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResult {
    pub price: Option<YahooPriceData>,
    pub summary_detail: Option<YahooSummaryDetail>,
}

/// `price` module
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooPriceData {
    pub market_cap: Option<YahooRawValue>,
    pub regular_market_price: Option<YahooRawValue>,
    pub regular_market_change: Option<YahooRawValue>,
    /// Fraction, e.g. 0.0123 for +1.23%
    pub regular_market_change_percent: Option<YahooRawValue>,
    pub regular_market_previous_close: Option<YahooRawValue>,
}

/// `summaryDetail` module
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSummaryDetail {
    pub market_cap: Option<YahooRawValue>,
    pub previous_close: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YahooRawValue {
    pub raw: Option<f64>,
}

/// Flatten `Option<YahooRawValue>` to the raw number
pub fn raw(value: &Option<YahooRawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}
