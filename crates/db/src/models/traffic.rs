use fleetwatch_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `traffic_samples`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrafficSampleRow {
    pub id: RecordId,
    pub request_count: i64,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub created_at: Timestamp,
}
