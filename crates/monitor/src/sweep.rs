//! The slow periodic sweep: stale task sessions and the traffic window.
//!
//! Both jobs share a timer but are independent: a failure to emit in one
//! does not stop the other.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fleetwatch_core::outbound::SessionExpired;
use fleetwatch_core::sinks::TrafficSample;
use tokio_util::sync::CancellationToken;

use crate::broadcast::BroadcastSink;
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::step::{ExpiredSession, StepTimingRegistry};
use crate::traffic::TrafficCounter;

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: Vec<ExpiredSession>,
    /// The closed traffic window, when it counted anything.
    pub traffic: Option<TrafficSample>,
}

/// Expires abandoned sessions and flushes the traffic counter on a fixed
/// tick.
pub struct SweepScheduler {
    sessions: Arc<StepTimingRegistry>,
    traffic: Arc<TrafficCounter>,
    broadcast: BroadcastSink,
    dispatch: Dispatcher,
    clock: Arc<dyn Clock>,
    tick: Duration,
    staleness_secs: i64,
}

impl SweepScheduler {
    pub fn new(
        sessions: Arc<StepTimingRegistry>,
        traffic: Arc<TrafficCounter>,
        broadcast: BroadcastSink,
        dispatch: Dispatcher,
        clock: Arc<dyn Clock>,
        tick: Duration,
        staleness_secs: i64,
    ) -> Self {
        Self {
            sessions,
            traffic,
            broadcast,
            dispatch,
            clock,
            tick,
            staleness_secs,
        }
    }

    /// Sweep every `tick` until `cancel` is triggered.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            tick_secs = self.tick.as_secs(),
            staleness_secs = self.staleness_secs,
            "Session sweep started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session sweep stopping");
                    break;
                }
                _ = tokio::time::sleep(self.tick) => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Flush traffic, then expire stale sessions.
    pub async fn sweep(&mut self) -> SweepReport {
        let traffic = self.flush_traffic();
        let expired = self.expire_sessions().await;
        SweepReport { expired, traffic }
    }

    fn flush_traffic(&self) -> Option<TrafficSample> {
        let sample = self.traffic.flush(self.clock.now());
        if sample.count == 0 {
            return None;
        }

        tracing::info!(count = sample.count, "Traffic window closed");
        self.dispatch.record_traffic(sample.clone());
        Some(sample)
    }

    async fn expire_sessions(&self) -> Vec<ExpiredSession> {
        let expired = self
            .sessions
            .expire_stale(self.clock.now(), self.staleness_secs);

        for ExpiredSession {
            session_id,
            session,
        } in &expired
        {
            tracing::info!(
                session_id = %session_id,
                node_id = %session.node_id,
                step = session.step,
                "Session expired",
            );

            let event = SessionExpired {
                pc_id: session.node_id.clone(),
                delete: session.bank.clone(),
            };
            match serde_json::to_vec(&event) {
                Ok(json) => {
                    self.broadcast.send(Bytes::from(json)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, session_id = %session_id, "Failed to encode session expiry");
                }
            }
        }

        expired
    }
}
