//! Repository for the `report_exceptions` table.

use fleetwatch_core::types::RecordId;
use sqlx::PgPool;

use crate::models::report::ReportExceptionRow;

const COLUMNS: &str = "id, report_id, exception, created_at";

/// Provides query operations for task-level exceptions.
pub struct ReportExceptionRepo;

impl ReportExceptionRepo {
    pub async fn insert(
        pool: &PgPool,
        report_id: RecordId,
        exception: &str,
    ) -> Result<ReportExceptionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_exceptions (report_id, exception) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportExceptionRow>(&query)
            .bind(report_id)
            .bind(exception)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_report(
        pool: &PgPool,
        report_id: RecordId,
    ) -> Result<Vec<ReportExceptionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM report_exceptions \
             WHERE report_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, ReportExceptionRow>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }
}
