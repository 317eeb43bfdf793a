/// Background jobs
///
/// - Market cap refresh: re-fetches quote data for every stock in batches and
///   rewrites the backing file

pub mod market_cap_refresh;

pub use market_cap_refresh::{CycleOutcome, MarketCapRefresher};
