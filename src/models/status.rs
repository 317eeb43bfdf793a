use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-memory state of the market cap refresh job
///
/// Resets to `(false, None)` on every process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub is_updating: bool,
    pub last_update_time: Option<DateTime<Utc>>,
}
