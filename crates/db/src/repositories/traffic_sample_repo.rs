//! Repository for the `traffic_samples` table (append-only time-series).

use fleetwatch_core::sinks::TrafficSample;
use fleetwatch_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::traffic::TrafficSampleRow;

const COLUMNS: &str = "id, request_count, window_start, window_end, created_at";

/// Provides query operations for traffic samples.
pub struct TrafficSampleRepo;

impl TrafficSampleRepo {
    pub async fn insert(
        pool: &PgPool,
        sample: &TrafficSample,
    ) -> Result<TrafficSampleRow, sqlx::Error> {
        // BIGINT is signed; a window never comes close to the limit.
        let count = i64::try_from(sample.count).unwrap_or(i64::MAX);

        let query = format!(
            "INSERT INTO traffic_samples (request_count, window_start, window_end) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrafficSampleRow>(&query)
            .bind(count)
            .bind(sample.window_start)
            .bind(sample.window_end)
            .fetch_one(pool)
            .await
    }

    /// Samples whose window closed at or after `since`, oldest first.
    pub async fn list_since(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<Vec<TrafficSampleRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM traffic_samples \
             WHERE window_end >= $1 \
             ORDER BY window_end"
        );
        sqlx::query_as::<_, TrafficSampleRow>(&query)
            .bind(since)
            .fetch_all(pool)
            .await
    }
}
