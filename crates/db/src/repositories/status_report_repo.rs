//! Repository for the `status_reports` table (append-only).

use fleetwatch_core::sinks::ReportRecord;
use fleetwatch_core::types::RecordId;
use sqlx::PgPool;

use crate::models::report::StatusReportRow;

/// Column list for `status_reports` SELECT queries.
const COLUMNS: &str = "\
    id, pc_id, ip, step, bank_name, sid, stc, exception, raw, \
    received_at, created_at";

/// Provides query operations for processed reports.
pub struct StatusReportRepo;

impl StatusReportRepo {
    /// Insert a processed report, returning its id.
    pub async fn insert(pool: &PgPool, report: &ReportRecord) -> Result<RecordId, sqlx::Error> {
        sqlx::query_scalar::<_, RecordId>(
            "INSERT INTO status_reports \
                (pc_id, ip, step, bank_name, sid, stc, exception, raw, received_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&report.node_id)
        .bind(&report.address)
        .bind(report.step)
        .bind(&report.bank)
        .bind(&report.session_id)
        .bind(report.elapsed_secs)
        .bind(&report.exception)
        .bind(&report.raw)
        .bind(report.received_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: RecordId,
    ) -> Result<Option<StatusReportRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM status_reports WHERE id = $1");
        sqlx::query_as::<_, StatusReportRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent reports from one node, newest first.
    pub async fn list_for_node(
        pool: &PgPool,
        pc_id: &str,
        limit: i64,
    ) -> Result<Vec<StatusReportRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM status_reports \
             WHERE pc_id = $1 \
             ORDER BY received_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, StatusReportRow>(&query)
            .bind(pc_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Every report of one task session, in arrival order.
    pub async fn list_for_session(
        pool: &PgPool,
        sid: &str,
    ) -> Result<Vec<StatusReportRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM status_reports \
             WHERE sid = $1 \
             ORDER BY received_at, id"
        );
        sqlx::query_as::<_, StatusReportRow>(&query)
            .bind(sid)
            .fetch_all(pool)
            .await
    }
}
