use std::sync::Arc;

use fleetwatch_core::sinks::{AlertSink, BroadcastTransport, PersistenceSink};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::broadcast::BroadcastSink;
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::dispatch::Dispatcher;
use crate::heartbeat::{HeartbeatRegistry, HeartbeatScheduler};
use crate::ingest::{IngestionQueue, ReportSender};
use crate::processor::StatusProcessor;
use crate::step::StepTimingRegistry;
use crate::sweep::SweepScheduler;
use crate::traffic::TrafficCounter;

/// The external services the monitor hands facts to.
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn PersistenceSink>,
    pub alerts: Arc<dyn AlertSink>,
    pub transport: Arc<dyn BroadcastTransport>,
}

/// A running monitoring engine.
///
/// Owns the report consumer, both schedulers, and the broadcast pump. The
/// registries are exposed read-only for health reporting.
pub struct Monitor {
    sender: ReportSender,
    heartbeats: Arc<HeartbeatRegistry>,
    sessions: Arc<StepTimingRegistry>,
    traffic: Arc<TrafficCounter>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    loops: Vec<JoinHandle<()>>,
    pump: JoinHandle<()>,
}

impl Monitor {
    /// Build the registries and spawn every long-lived task.
    pub fn start(config: &MonitorConfig, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let heartbeats = Arc::new(HeartbeatRegistry::new());
        let sessions = Arc::new(StepTimingRegistry::new(config.terminal_step));
        let traffic = Arc::new(TrafficCounter::new(clock.now()));

        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        let (broadcast, pump) =
            BroadcastSink::new(collaborators.transport, config.broadcast_buffer_capacity);
        let dispatch = Dispatcher::new(
            collaborators.persistence,
            collaborators.alerts,
            tracker.clone(),
        );

        let processor = Arc::new(StatusProcessor::new(
            Arc::clone(&heartbeats),
            Arc::clone(&sessions),
            Arc::clone(&traffic),
            broadcast.clone(),
            dispatch.clone(),
            Arc::clone(&clock),
        ));

        let heartbeat_scheduler = HeartbeatScheduler::new(
            Arc::clone(&heartbeats),
            broadcast.clone(),
            dispatch.clone(),
            Arc::clone(&clock),
            config.heartbeat_interval(),
            config.dead_after_secs(),
        );

        let sweep_scheduler = SweepScheduler::new(
            Arc::clone(&sessions),
            Arc::clone(&traffic),
            broadcast,
            dispatch,
            clock,
            config.sweep_tick(),
            config.step_staleness_secs,
        );

        let (sender, queue) = IngestionQueue::bounded(config.ingestion_queue_capacity);

        let loops = vec![
            tokio::spawn(queue.run(processor, tracker.clone(), cancel.clone())),
            tokio::spawn(heartbeat_scheduler.run(cancel.clone())),
            tokio::spawn(sweep_scheduler.run(cancel.clone())),
        ];
        let pump = tokio::spawn(pump.run());

        tracing::info!(
            queue_capacity = config.ingestion_queue_capacity,
            "Monitor started",
        );

        Self {
            sender,
            heartbeats,
            sessions,
            traffic,
            cancel,
            tracker,
            loops,
            pump,
        }
    }

    /// Producer handle for raw reports.
    pub fn sender(&self) -> ReportSender {
        self.sender.clone()
    }

    pub fn heartbeats(&self) -> &Arc<HeartbeatRegistry> {
        &self.heartbeats
    }

    pub fn sessions(&self) -> &Arc<StepTimingRegistry> {
        &self.sessions
    }

    pub fn traffic(&self) -> &Arc<TrafficCounter> {
        &self.traffic
    }

    /// A token cancelled when [`shutdown`](Self::shutdown) begins, for
    /// companion tasks that should stop with the monitor.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Stop the timers, drain buffered reports, and wait for in-flight
    /// processing and collaborator calls to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();

        for handle in self.loops {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Monitor task failed");
            }
        }

        self.tracker.close();
        self.tracker.wait().await;

        // Every BroadcastSink clone is gone once the tasks above are done,
        // which closes the pump's queue.
        if let Err(e) = self.pump.await {
            tracing::error!(error = %e, "Broadcast pump failed");
        }

        tracing::info!("Monitor stopped");
    }
}
