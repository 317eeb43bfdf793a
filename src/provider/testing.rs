//! In-memory provider used by tests across the crate

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ProviderError, QuoteProvider};
use crate::models::QuoteSnapshot;

/// Returns canned market caps, failing for unknown symbols
///
/// Tracks the total number of calls and the highest number of calls that
/// were in flight at the same time.
pub struct StaticProvider {
    market_caps: Mutex<HashMap<String, Option<f64>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticProvider {
    pub fn new<I, S>(market_caps: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        Self {
            market_caps: Mutex::new(
                market_caps
                    .into_iter()
                    .map(|(symbol, cap)| (symbol.into(), cap))
                    .collect(),
            ),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the answer for `symbol` on subsequent calls
    pub fn set_market_cap(&self, symbol: &str, market_cap: Option<f64>) {
        self.market_caps.lock().insert(symbol.to_string(), market_cap);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StaticProvider {
    fn id(&self) -> &'static str {
        "STATIC"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let answer = self.market_caps.lock().get(symbol).copied();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match answer {
            Some(market_cap) => Ok(QuoteSnapshot {
                market_cap,
                price_change: market_cap.map(|_| 1.0),
                price_change_percent: market_cap.map(|_| 0.5),
            }),
            None => Err(ProviderError::SymbolNotFound(symbol.to_string())),
        }
    }
}
