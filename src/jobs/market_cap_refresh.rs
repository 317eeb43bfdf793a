use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::RwLock;

use crate::config::RefreshConfig;
use crate::models::{JobStatus, QuoteSnapshot, StockRecord};
use crate::provider::QuoteProvider;
use crate::store::StockStore;

/// Result of one call to [`MarketCapRefresher::run_refresh_cycle`]
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle was in flight; nothing was done
    AlreadyRunning,

    /// At least one symbol received a market cap and the file was rewritten
    Updated {
        updated: usize,
        total: usize,
        completed_at: DateTime<Utc>,
    },

    /// No symbol received a market cap; the file was left alone
    NoValidData {
        total: usize,
        /// False when a retry from an earlier cycle is still pending
        retry_scheduled: bool,
    },

    /// The stock list could not be read or the new file could not be written
    Failed(String),
}

/// Market cap refresh job
///
/// Owns the job status shared by the scheduler, startup reconciliation and
/// the status endpoint. Only one cycle runs at a time; callers that arrive
/// while a cycle is in flight get [`CycleOutcome::AlreadyRunning`].
pub struct MarketCapRefresher {
    store: Arc<StockStore>,
    provider: Arc<dyn QuoteProvider>,
    config: RefreshConfig,
    is_updating: AtomicBool,
    retry_pending: AtomicBool,
    last_update_time: RwLock<Option<DateTime<Utc>>>,
}

impl MarketCapRefresher {
    pub fn new(
        store: Arc<StockStore>,
        provider: Arc<dyn QuoteProvider>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            is_updating: AtomicBool::new(false),
            retry_pending: AtomicBool::new(false),
            last_update_time: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<StockStore> {
        &self.store
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Snapshot of the in-memory job status
    pub fn status(&self) -> JobStatus {
        JobStatus {
            is_updating: self.is_updating.load(Ordering::Acquire),
            last_update_time: *self.last_update_time.read(),
        }
    }

    /// Run one refresh cycle over every stock in the backing file
    ///
    /// Symbols are fetched concurrently in batches of `batch_size`, with
    /// `batch_delay` between batches. A failed lookup leaves that record as it
    /// was. If no symbol receives a positive market cap the file is not
    /// touched and one retry is scheduled after `retry_delay`.
    pub fn run_refresh_cycle(self: &Arc<Self>) -> BoxFuture<'static, CycleOutcome> {
        let this = Arc::clone(self);
        async move { this.refresh_cycle().await }.boxed()
    }

    async fn refresh_cycle(self: Arc<Self>) -> CycleOutcome {
        if self
            .is_updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Market cap refresh already in progress, skipping");
            return CycleOutcome::AlreadyRunning;
        }
        let _updating = UpdatingGuard(&self.is_updating);

        let started = Instant::now();

        let mut records = match self.store.load().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Market cap refresh aborted, cannot load stock list: {}", e);
                return CycleOutcome::Failed(e.to_string());
            }
        };

        let total = records.len();
        tracing::info!(
            "Starting market cap refresh of {} stocks ({}, at least {:.0}s)",
            total,
            self.provider.id(),
            self.minimum_cycle_time(total).as_secs_f64()
        );
        let updated = self.refresh_records(&mut records).await;

        if updated == 0 {
            tracing::error!(
                "Market cap refresh produced no valid data for {} stocks, keeping existing file",
                total
            );
            let retry_scheduled = self.schedule_retry();
            return CycleOutcome::NoValidData {
                total,
                retry_scheduled,
            };
        }

        if let Err(e) = self.store.save(&records).await {
            tracing::error!("Failed to write refreshed stock data: {}", e);
            return CycleOutcome::Failed(e.to_string());
        }

        let completed_at = Utc::now();
        *self.last_update_time.write() = Some(completed_at);

        tracing::info!(
            "Market cap refresh completed: {}/{} stocks updated in {:.1}s",
            updated,
            total,
            started.elapsed().as_secs_f64()
        );

        CycleOutcome::Updated {
            updated,
            total,
            completed_at,
        }
    }

    /// Fetch and merge quotes batch by batch, returning how many records
    /// received a positive market cap
    async fn refresh_records(&self, records: &mut [StockRecord]) -> usize {
        let batch_size = self.config.batch_size.max(1);
        let batch_count = records.len().div_ceil(batch_size);
        let mut updated = 0;

        for (index, batch) in records.chunks_mut(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_delay()).await;
            }

            let quotes = join_all(batch.iter().map(|record| self.fetch_symbol(&record.symbol))).await;

            for (record, quote) in batch.iter_mut().zip(quotes) {
                if let Some(quote) = quote {
                    if record.apply_quote(&quote) {
                        updated += 1;
                    }
                }
            }

            tracing::debug!("Processed batch {}/{}", index + 1, batch_count);
        }

        updated
    }

    async fn fetch_symbol(&self, symbol: &str) -> Option<QuoteSnapshot> {
        match self.provider.fetch_quote(symbol).await {
            Ok(quote) => {
                if quote.market_cap.is_none() {
                    tracing::debug!("No market cap reported for {}", symbol);
                }
                Some(quote)
            }
            Err(e) => {
                let hint = if e.is_transient() { "will retry next cycle" } else { "not retryable" };
                tracing::warn!("Failed to fetch quote for {} ({}): {}", symbol, hint, e);
                None
            }
        }
    }

    /// Schedule a single retry of the whole cycle
    ///
    /// Returns false if a retry is already waiting to run.
    fn schedule_retry(self: &Arc<Self>) -> bool {
        if self.retry_pending.swap(true, Ordering::AcqRel) {
            tracing::debug!("Market cap refresh retry already pending");
            return false;
        }

        let delay = self.config.retry_delay();
        tracing::warn!("Retrying market cap refresh in {}s", delay.as_secs());

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.retry_pending.store(false, Ordering::Release);
            let outcome = this.run_refresh_cycle().await;
            tracing::debug!("Market cap refresh retry finished: {:?}", outcome);
        });

        true
    }

    /// Time a full cycle needs at minimum, given `records` stocks
    pub fn minimum_cycle_time(&self, records: usize) -> Duration {
        let batches = records.div_ceil(self.config.batch_size.max(1)) as u32;
        self.config.batch_delay() * batches.saturating_sub(1)
    }
}

/// Clears the updating flag when the cycle ends, however it ends
struct UpdatingGuard<'a>(&'a AtomicBool);

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
