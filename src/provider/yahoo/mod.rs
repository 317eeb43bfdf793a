//! Yahoo Finance quote provider
//!
//! Uses the quoteSummary endpoint (`price` and `summaryDetail` modules), which
//! requires a cookie plus crumb pair obtained once and reused until Yahoo
//! rejects it.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use tokio::sync::Mutex;
use tracing::debug;
use urlencoding::encode;

use crate::models::QuoteSnapshot;

use super::{ProviderError, QuoteProvider};
use models::{raw, YahooQuoteSummaryResponse, YahooQuoteSummaryResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

pub struct YahooProvider {
    client: reqwest::Client,
    // Held across the handshake so a batch of concurrent lookups fetches one crumb
    crumb: Mutex<Option<CrumbData>>,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            crumb: Mutex::new(None),
        })
    }

    async fn ensure_crumb(&self) -> Result<CrumbData, ProviderError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<CrumbData, ProviderError> {
        debug!("Fetching Yahoo authentication crumb");

        // fc.yahoo.com answers 404 but still sets the session cookie
        let response = self
            .client
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to get cookie: {}", e)))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| ProviderError::Auth("Failed to parse Yahoo cookie".to_string()))?;

        let response = self
            .client
            .get(CRUMB_URL)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to get crumb: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "Crumb request returned HTTP {}",
                response.status()
            )));
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to read crumb: {}", e)))?;

        if crumb.trim().is_empty() {
            return Err(ProviderError::Auth("Empty crumb".to_string()));
        }

        Ok(CrumbData {
            cookie,
            crumb: crumb.trim().to_string(),
        })
    }

    async fn clear_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<YahooQuoteSummaryResult, ProviderError> {
        let crumb = self.ensure_crumb().await?;

        let url = format!(
            "{}/{}?modules=price,summaryDetail&crumb={}",
            QUOTE_SUMMARY_URL,
            encode(symbol),
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.clear_crumb().await;
                return Err(ProviderError::Auth("Yahoo authentication expired".to_string()));
            }
            StatusCode::NOT_FOUND => return Err(ProviderError::SymbolNotFound(symbol.to_string())),
            status if !status.is_success() => {
                return Err(ProviderError::Request {
                    symbol: symbol.to_string(),
                    message: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        let data: YahooQuoteSummaryResponse =
            response.json().await.map_err(|e| ProviderError::InvalidResponse {
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;

        first_result(symbol, data)
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "YAHOO"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
        let summary = self.fetch_summary(symbol).await?;
        Ok(map_summary(&summary))
    }
}

fn first_result(
    symbol: &str,
    data: YahooQuoteSummaryResponse,
) -> Result<YahooQuoteSummaryResult, ProviderError> {
    if let Some(error) = data.quote_summary.error {
        let message = error
            .description
            .or(error.code)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(ProviderError::InvalidResponse {
            symbol: symbol.to_string(),
            message,
        });
    }

    data.quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::SymbolNotFound(symbol.to_string()))
}

/// Map a quoteSummary result to the fields the refresh job stores
///
/// Market cap prefers the `price` module and falls back to `summaryDetail`.
/// Missing change values are derived from price and previous close.
fn map_summary(result: &YahooQuoteSummaryResult) -> QuoteSnapshot {
    let price = result.price.as_ref();
    let detail = result.summary_detail.as_ref();

    let market_cap = price
        .and_then(|p| raw(&p.market_cap))
        .or_else(|| detail.and_then(|d| raw(&d.market_cap)));

    let last = price.and_then(|p| raw(&p.regular_market_price));
    let previous_close = price
        .and_then(|p| raw(&p.regular_market_previous_close))
        .or_else(|| detail.and_then(|d| raw(&d.previous_close)));

    let price_change = price
        .and_then(|p| raw(&p.regular_market_change))
        .or_else(|| Some(last? - previous_close?));

    let price_change_percent = price
        .and_then(|p| raw(&p.regular_market_change_percent))
        .map(|fraction| fraction * 100.0)
        .or_else(|| {
            let change = price_change?;
            let previous_close = previous_close.filter(|c| *c != 0.0)?;
            Some(change / previous_close * 100.0)
        });

    QuoteSnapshot {
        market_cap,
        price_change,
        price_change_percent,
    }
}
