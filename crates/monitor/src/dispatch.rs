//! Fire-and-forget calls into the persistence and alert collaborators.
//!
//! Each call is spawned on the shared [`TaskTracker`] and never awaited by
//! the monitor, so a slow or failing collaborator cannot stall ingestion
//! or the sweeps. Failures are logged here and go no further. Shutdown
//! waits on the tracker so queued writes still land.

use std::sync::Arc;

use fleetwatch_core::sinks::{
    Alert, AlertSink, NodeDeath, PersistenceSink, ReportRecord, TaskProgress, TrafficSample,
};
use tokio_util::task::TaskTracker;

/// Timestamp layout used in alert context.
pub const ALERT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle for detached collaborator calls. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    persistence: Arc<dyn PersistenceSink>,
    alerts: Arc<dyn AlertSink>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        persistence: Arc<dyn PersistenceSink>,
        alerts: Arc<dyn AlertSink>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            persistence,
            alerts,
            tracker,
        }
    }

    pub fn alert(&self, alert: Alert) {
        let alerts = Arc::clone(&self.alerts);
        self.tracker.spawn(async move {
            if let Err(e) = alerts.notify(&alert).await {
                tracing::error!(
                    error = %e,
                    template = alert.template.name(),
                    "Failed to deliver alert",
                );
            }
        });
    }

    /// Store a report, then attach `task_exception` to the stored record
    /// when there is one.
    pub fn record_report(&self, report: ReportRecord, task_exception: Option<String>) {
        let persistence = Arc::clone(&self.persistence);
        self.tracker.spawn(async move {
            let record_id = match persistence.record_report(&report).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(error = %e, node_id = %report.node_id, "Failed to record report");
                    return;
                }
            };

            if let Some(exception) = task_exception {
                if let Err(e) = persistence.record_exception(record_id, &exception).await {
                    tracing::error!(error = %e, record_id, "Failed to record task exception");
                }
            }
        });
    }

    pub fn record_death(&self, death: NodeDeath) {
        let persistence = Arc::clone(&self.persistence);
        self.tracker.spawn(async move {
            if let Err(e) = persistence.record_death(&death).await {
                tracing::error!(error = %e, node_id = %death.node_id, "Failed to record node death");
            }
        });
    }

    pub fn record_traffic(&self, sample: TrafficSample) {
        let persistence = Arc::clone(&self.persistence);
        self.tracker.spawn(async move {
            if let Err(e) = persistence.record_traffic(&sample).await {
                tracing::error!(error = %e, count = sample.count, "Failed to record traffic sample");
            }
        });
    }

    pub fn record_progress(&self, progress: TaskProgress) {
        let persistence = Arc::clone(&self.persistence);
        self.tracker.spawn(async move {
            if let Err(e) = persistence.record_progress(&progress).await {
                tracing::error!(
                    error = %e,
                    node_id = %progress.node_id,
                    session_id = %progress.session_id,
                    "Failed to record task progress",
                );
            }
        });
    }
}
