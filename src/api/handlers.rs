use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::jobs::MarketCapRefresher;

use super::errors::ApiError;
use super::responses::*;

/// Shared application state
pub type AppState = Arc<MarketCapRefresher>;

/// Market cap refresh status
///
/// `hasValidData` re-reads the stock file on every request.
#[utoipa::path(
    get,
    path = "/market-cap-status",
    tag = "Status",
    responses(
        (status = 200, description = "Refresh job status", body = MarketCapStatusResponse)
    )
)]
pub async fn get_market_cap_status(State(refresher): State<AppState>) -> Json<MarketCapStatusResponse> {
    let status = refresher.status();
    let has_valid_data = refresher.store().has_valid_data().await;

    Json(MarketCapStatusResponse {
        is_updating: status.is_updating,
        last_update: status.last_update_time,
        has_valid_data,
    })
}

/// Stock list, served uncached
#[utoipa::path(
    get,
    path = "/stocks.json",
    tag = "Data",
    responses(
        (status = 200, description = "JSON array of stock records"),
        (status = 404, description = "Stock file not present", body = ErrorResponse)
    )
)]
pub async fn get_stocks_json(State(refresher): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = refresher.store().read_raw().await.map_err(|e| {
        if e.is_not_found() {
            ApiError::NotFound("stocks.json".to_string())
        } else {
            tracing::error!("{}", e);
            ApiError::Internal("failed to read stock data".to_string())
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        body,
    ))
}

/// Empty favicon
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
