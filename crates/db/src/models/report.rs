use fleetwatch_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `status_reports`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusReportRow {
    pub id: RecordId,
    pub pc_id: String,
    pub ip: String,
    pub step: i64,
    pub bank_name: String,
    pub sid: String,
    /// Step duration in seconds; `0` when unknown.
    pub stc: i64,
    pub exception: String,
    pub raw: String,
    pub received_at: Timestamp,
    pub created_at: Timestamp,
}

/// A row from `report_exceptions`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportExceptionRow {
    pub id: RecordId,
    pub report_id: RecordId,
    pub exception: String,
    pub created_at: Timestamp,
}
