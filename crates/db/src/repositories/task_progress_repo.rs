//! Repository for the `task_progress` table.

use fleetwatch_core::sinks::TaskProgress;
use sqlx::PgPool;

use crate::models::node::TaskProgressRow;

const COLUMNS: &str = "id, pc_id, bank_name, sid, step, updated_at";

/// Provides query operations for per-task progress.
pub struct TaskProgressRepo;

impl TaskProgressRepo {
    /// Insert or update the latest step of a task.
    ///
    /// Uses `INSERT ... ON CONFLICT (pc_id, bank_name, sid) DO UPDATE` to
    /// upsert in a single round-trip.
    pub async fn upsert(
        pool: &PgPool,
        progress: &TaskProgress,
    ) -> Result<TaskProgressRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_progress (pc_id, bank_name, sid, step) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (pc_id, bank_name, sid) DO UPDATE SET \
                step = EXCLUDED.step, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskProgressRow>(&query)
            .bind(&progress.node_id)
            .bind(&progress.bank)
            .bind(&progress.session_id)
            .bind(progress.step)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        pc_id: &str,
        bank_name: &str,
        sid: &str,
    ) -> Result<Option<TaskProgressRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_progress \
             WHERE pc_id = $1 AND bank_name = $2 AND sid = $3"
        );
        sqlx::query_as::<_, TaskProgressRow>(&query)
            .bind(pc_id)
            .bind(bank_name)
            .bind(sid)
            .fetch_optional(pool)
            .await
    }
}
