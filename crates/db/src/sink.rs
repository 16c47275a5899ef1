//! [`PersistenceSink`] backed by PostgreSQL.

use async_trait::async_trait;
use fleetwatch_core::sinks::{
    NodeDeath, PersistenceSink, ReportRecord, SinkError, SinkResult, TaskProgress, TrafficSample,
};
use fleetwatch_core::types::RecordId;

use crate::repositories::{
    NodeDeathRepo, ReportExceptionRepo, StatusReportRepo, TaskProgressRepo, TrafficSampleRepo,
};
use crate::DbPool;

/// Writes monitoring facts through the repositories.
#[derive(Clone)]
pub struct PgPersistenceSink {
    pool: DbPool,
}

impl PgPersistenceSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn persistence_error(e: sqlx::Error) -> SinkError {
    SinkError::Persistence(e.to_string())
}

#[async_trait]
impl PersistenceSink for PgPersistenceSink {
    async fn record_report(&self, report: &ReportRecord) -> SinkResult<RecordId> {
        StatusReportRepo::insert(&self.pool, report)
            .await
            .map_err(persistence_error)
    }

    async fn record_exception(&self, record_id: RecordId, exception: &str) -> SinkResult<()> {
        ReportExceptionRepo::insert(&self.pool, record_id, exception)
            .await
            .map_err(persistence_error)?;
        Ok(())
    }

    async fn record_death(&self, death: &NodeDeath) -> SinkResult<()> {
        let row = NodeDeathRepo::insert(&self.pool, death)
            .await
            .map_err(persistence_error)?;
        tracing::debug!(id = row.id, node_id = %row.pc_id, "Node death stored");
        Ok(())
    }

    async fn record_traffic(&self, sample: &TrafficSample) -> SinkResult<()> {
        TrafficSampleRepo::insert(&self.pool, sample)
            .await
            .map_err(persistence_error)?;
        Ok(())
    }

    async fn record_progress(&self, progress: &TaskProgress) -> SinkResult<()> {
        TaskProgressRepo::upsert(&self.pool, progress)
            .await
            .map_err(persistence_error)?;
        Ok(())
    }
}
