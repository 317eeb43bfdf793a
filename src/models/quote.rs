/// Fields the provider reports for a single symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    pub market_cap: Option<f64>,
    pub price_change: Option<f64>,
    /// Percentage points, e.g. `1.5` for +1.5%
    pub price_change_percent: Option<f64>,
}
