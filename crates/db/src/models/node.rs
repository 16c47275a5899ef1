use fleetwatch_core::types::{RecordId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `node_deaths`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NodeDeathRow {
    pub id: RecordId,
    pub pc_id: String,
    pub ip: String,
    pub dead_at: Timestamp,
    pub created_at: Timestamp,
}

/// A row from `task_progress`. One per `(pc_id, bank_name, sid)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskProgressRow {
    pub id: RecordId,
    pub pc_id: String,
    pub bank_name: String,
    pub sid: String,
    pub step: i64,
    pub updated_at: Timestamp,
}
