//! One-time check at process start deciding whether the stock data needs an
//! immediate refresh

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use crate::jobs::MarketCapRefresher;
use crate::market_hours::is_market_open;
use crate::models::StockRecord;
use crate::store::StockStore;

/// Why a startup refresh was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// The backing file is missing or cannot be parsed
    MissingFile,
    /// No record holds a positive market cap
    NoValidData,
    /// `--force-refresh` was passed at launch
    Forced,
    /// The file is older than the refresh interval
    Stale,
}

/// Inspect the backing file and return the first reason it needs refreshing
pub async fn refresh_reason(
    store: &StockStore,
    force: bool,
    max_age: Duration,
    now: SystemTime,
) -> Option<RefreshReason> {
    let records = match store.load().await {
        Ok(records) => records,
        Err(e) => {
            tracing::info!("Stock data unavailable at startup: {}", e);
            return Some(RefreshReason::MissingFile);
        }
    };

    if !records.iter().any(StockRecord::has_valid_market_cap) {
        return Some(RefreshReason::NoValidData);
    }

    if force {
        return Some(RefreshReason::Forced);
    }

    match store.age(now).await {
        Ok(age) if age > max_age => Some(RefreshReason::Stale),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Cannot read stock file modification time: {}", e);
            Some(RefreshReason::MissingFile)
        }
    }
}

/// Apply the optional market-hours gate to a startup refresh
///
/// Forced refreshes are never gated.
pub fn apply_market_gate(
    reason: Option<RefreshReason>,
    requires_open_market: bool,
    now: DateTime<Utc>,
) -> Option<RefreshReason> {
    match reason {
        Some(RefreshReason::Forced) => reason,
        Some(_) if requires_open_market && !is_market_open(now) => None,
        other => other,
    }
}

/// Decide on and start the startup refresh
///
/// The refresh runs in the background; the returned reason is `None` when
/// nothing was started.
pub async fn reconcile(
    refresher: &Arc<MarketCapRefresher>,
    force: bool,
    now: DateTime<Utc>,
) -> Option<RefreshReason> {
    let config = refresher.config();
    let reason = refresh_reason(
        refresher.store(),
        force,
        config.refresh_interval(),
        SystemTime::from(now),
    )
    .await;

    let gated = apply_market_gate(reason, config.startup_requires_open_market, now);

    match (reason, gated) {
        (None, _) => {
            tracing::info!("Stock data is fresh, skipping startup refresh");
        }
        (Some(reason), None) => {
            tracing::info!(
                "Startup refresh needed ({:?}) but the market is closed, waiting for the scheduler",
                reason
            );
        }
        (Some(_), Some(reason)) => {
            tracing::info!("Starting market cap refresh at startup ({:?})", reason);
            tokio::spawn(refresher.run_refresh_cycle());
        }
    }

    gated
}
