use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fleetwatch_core::outbound::encode_heartbeat_batch;
use fleetwatch_core::sinks::{Alert, AlertTemplate, NodeDeath};
use tokio_util::sync::CancellationToken;

use crate::broadcast::BroadcastSink;
use crate::clock::Clock;
use crate::dispatch::{Dispatcher, ALERT_TIME_FORMAT};
use crate::heartbeat::registry::{HeartbeatRegistry, HeartbeatSweep};

/// Periodic liveness sweep over the [`HeartbeatRegistry`].
///
/// The sweep classifies every node and removes the dead ones in a single
/// iterate-then-mutate pass, so it must never overlap with itself. That is
/// enforced by ownership: [`sweep`](Self::sweep) takes `&mut self` and
/// [`run`](Self::run) consumes the scheduler, awaiting each sweep before
/// arming the timer for the next one.
pub struct HeartbeatScheduler {
    registry: Arc<HeartbeatRegistry>,
    broadcast: BroadcastSink,
    dispatch: Dispatcher,
    clock: Arc<dyn Clock>,
    interval: Duration,
    dead_after_secs: i64,
}

impl HeartbeatScheduler {
    pub fn new(
        registry: Arc<HeartbeatRegistry>,
        broadcast: BroadcastSink,
        dispatch: Dispatcher,
        clock: Arc<dyn Clock>,
        interval: Duration,
        dead_after_secs: i64,
    ) -> Self {
        Self {
            registry,
            broadcast,
            dispatch,
            clock,
            interval,
            dead_after_secs,
        }
    }

    /// Sweep every `interval` until `cancel` is triggered.
    ///
    /// The timer is re-armed only after a sweep completes, so a slow sweep
    /// delays the next one instead of stacking up behind it.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            dead_after_secs = self.dead_after_secs,
            "Heartbeat scheduler started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Heartbeat scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Classify every tracked node, publish the batch, and report deaths.
    pub async fn sweep(&mut self) -> HeartbeatSweep {
        let now = self.clock.now();
        let late_after_secs = i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX);
        let sweep = self
            .registry
            .sweep(now, late_after_secs, self.dead_after_secs)
            .await;

        for dead in &sweep.deaths {
            tracing::error!(
                node_id = %dead.node_id,
                ip = %dead.address,
                missing_secs = dead.missing_secs,
                "Node is down",
            );

            self.dispatch.record_death(NodeDeath {
                node_id: dead.node_id.clone(),
                address: dead.address.clone(),
                dead_at: dead.last_seen,
            });

            self.dispatch.alert(
                Alert::new(AlertTemplate::NodeDown)
                    .with("pc_id", dead.node_id.as_str())
                    .with("ip", dead.address.as_str())
                    .with("missing_secs", dead.missing_secs)
                    .with(
                        "down_time",
                        dead.last_seen.format(ALERT_TIME_FORMAT).to_string(),
                    )
                    .with("last_data", dead.last_payload.clone().unwrap_or_default()),
            );
        }

        if !sweep.beats.is_empty() {
            match encode_heartbeat_batch(&sweep.beats) {
                Ok(json) => {
                    self.broadcast.send(Bytes::from(json)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode heartbeat batch");
                }
            }
        }

        tracing::debug!(
            nodes = sweep.beats.len(),
            dead = sweep.deaths.len(),
            "Heartbeat sweep complete",
        );

        sweep
    }
}
