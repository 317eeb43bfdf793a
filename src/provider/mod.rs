//! Market quote providers
//!
//! The refresh job only needs market cap and daily price change per symbol,
//! so the provider seam is a single async lookup.

pub mod errors;
pub mod yahoo;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::models::QuoteSnapshot;

pub use errors::ProviderError;
pub use yahoo::YahooProvider;

/// Source of per-symbol quote data
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short identifier used in logs
    fn id(&self) -> &'static str;

    /// Fetch the current market cap and price change for `symbol`
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError>;
}
