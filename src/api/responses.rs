use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Market cap refresh job status
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketCapStatusResponse {
    /// True while a refresh cycle is running
    pub is_updating: bool,
    /// Completion time of the last successful refresh since process start
    pub last_update: Option<DateTime<Utc>>,
    /// True if the stock file currently holds at least one positive market cap
    pub has_valid_data: bool,
}

/// Liveness response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
