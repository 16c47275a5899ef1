//! Turns one raw report into registry updates and at most one outbound
//! status event.

use std::sync::Arc;

use bytes::Bytes;
use fleetwatch_core::report::{ProgressPayload, StatusReport};
use fleetwatch_core::sinks::{Alert, AlertTemplate, ReportRecord, TaskProgress};
use fleetwatch_core::types::Timestamp;
use serde_json::Value;

use crate::broadcast::BroadcastSink;
use crate::clock::Clock;
use crate::dispatch::{Dispatcher, ALERT_TIME_FORMAT};
use crate::heartbeat::HeartbeatRegistry;
use crate::step::{StepTimingRegistry, StepTransition};
use crate::traffic::TrafficCounter;

/// Step value used when a report carries no usable step.
const NO_STEP: i64 = -1;

/// How a single report was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The payload could not be decoded. Nothing was touched.
    Malformed,
    /// The report had no node id. Nothing was touched.
    Discarded,
    /// Liveness only: the report carried no task progress.
    Heartbeat,
    /// Same session and step as the previous report; no event went out.
    Duplicate,
    /// A status event was offered to subscribers.
    Forwarded { elapsed_secs: i64 },
}

/// Shared state the processor updates.
pub struct StatusProcessor {
    heartbeats: Arc<HeartbeatRegistry>,
    sessions: Arc<StepTimingRegistry>,
    traffic: Arc<TrafficCounter>,
    broadcast: BroadcastSink,
    dispatch: Dispatcher,
    clock: Arc<dyn Clock>,
}

impl StatusProcessor {
    pub fn new(
        heartbeats: Arc<HeartbeatRegistry>,
        sessions: Arc<StepTimingRegistry>,
        traffic: Arc<TrafficCounter>,
        broadcast: BroadcastSink,
        dispatch: Dispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            heartbeats,
            sessions,
            traffic,
            broadcast,
            dispatch,
            clock,
        }
    }

    /// Process one report.
    ///
    /// Only decoding happens before the first registry write; collaborator
    /// calls are dispatched without being awaited.
    pub async fn process(&self, raw: &[u8]) -> ProcessOutcome {
        let report = match StatusReport::parse(raw) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    raw = %String::from_utf8_lossy(raw),
                    "Discarding malformed status report",
                );
                return ProcessOutcome::Malformed;
            }
        };

        if report.node_id.is_empty() {
            return ProcessOutcome::Discarded;
        }

        let now = self.clock.now();
        let raw_text = String::from_utf8_lossy(raw).into_owned();

        self.heartbeats
            .refresh(&report.node_id, &report.address, now)
            .await;

        if report.has_exception() {
            tracing::warn!(
                node_id = %report.node_id,
                exception = %report.exception,
                "Node reported an exception",
            );
            self.dispatch.alert(exception_alert(
                AlertTemplate::NodeException,
                &report,
                &report.exception,
                &raw_text,
                now,
            ));
        }

        let Some(progress) = report.progress.as_ref() else {
            return ProcessOutcome::Heartbeat;
        };

        tracing::debug!(node_id = %report.node_id, raw = %raw_text, "Task progress received");
        self.heartbeats
            .store_payload(&report.node_id, raw_text.clone())
            .await;

        let step = progress.step().unwrap_or(NO_STEP);
        let session_id = progress.session_id().unwrap_or_default();
        self.traffic.incr();

        let progress_record = TaskProgress {
            node_id: report.node_id.clone(),
            bank: report.bank.clone(),
            session_id: session_id.to_string(),
            step,
        };

        let mut elapsed_secs = 0;
        if !session_id.is_empty() && step >= 0 {
            let transition =
                self.sessions
                    .advance(session_id, step, &report.node_id, &report.bank, now);
            if transition == StepTransition::Duplicate {
                tracing::debug!(
                    node_id = %report.node_id,
                    session_id,
                    step,
                    "Duplicate step report",
                );
                // Duplicates still refresh the stored progress row.
                self.dispatch.record_progress(progress_record);
                return ProcessOutcome::Duplicate;
            }
            elapsed_secs = transition.elapsed_secs();
        }

        self.broadcast
            .send(status_event(progress, elapsed_secs))
            .await;

        let task_exception = progress
            .exception()
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if let Some(exception) = &task_exception {
            tracing::warn!(
                node_id = %report.node_id,
                session_id,
                exception = %exception,
                "Task reported an exception",
            );
            self.dispatch.alert(exception_alert(
                AlertTemplate::TaskException,
                &report,
                exception,
                &raw_text,
                now,
            ));
        }

        self.dispatch.record_report(
            ReportRecord {
                node_id: report.node_id.clone(),
                address: report.address.clone(),
                step,
                bank: report.bank.clone(),
                session_id: session_id.to_string(),
                elapsed_secs,
                exception: task_exception.clone().unwrap_or_default(),
                raw: raw_text,
                received_at: now,
            },
            task_exception,
        );
        self.dispatch.record_progress(progress_record);

        ProcessOutcome::Forwarded { elapsed_secs }
    }
}

/// The outbound status event: the progress payload as received, with `stc`
/// appended when a step duration is known.
fn status_event(progress: &ProgressPayload, elapsed_secs: i64) -> Bytes {
    if elapsed_secs > 0 {
        Bytes::from(progress.with_step_duration(elapsed_secs))
    } else {
        Bytes::copy_from_slice(progress.as_raw().as_bytes())
    }
}

fn exception_alert(
    template: AlertTemplate,
    report: &StatusReport,
    exception: &str,
    raw: &str,
    now: Timestamp,
) -> Alert {
    let progress = report
        .progress
        .as_ref()
        .map(|p| Value::Object(p.fields().clone()))
        .unwrap_or(Value::Null);

    Alert::new(template)
        .with("pc_id", report.node_id.as_str())
        .with("ip", report.address.as_str())
        .with("exception", exception)
        .with("bank_status", progress)
        .with("time", now.format(ALERT_TIME_FORMAT).to_string())
        .with("data", raw)
}
