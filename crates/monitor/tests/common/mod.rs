//! Shared fixtures for monitor integration tests.
//!
//! [`Harness`] wires the processor and both schedulers to recording fakes
//! and a [`ManualClock`]. Collaborator calls are fire-and-forget, so
//! assertions on what the fakes saw happen after [`Harness::finish`], which
//! waits for every detached task and flushes the broadcast queue.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use fleetwatch_core::sinks::{
    Alert, AlertSink, BroadcastTransport, NodeDeath, PersistenceSink, ReportRecord, SinkError,
    SinkResult, TaskProgress, TrafficSample,
};
use fleetwatch_core::types::{RecordId, Timestamp};
use fleetwatch_monitor::broadcast::{BroadcastPump, BroadcastSink};
use fleetwatch_monitor::clock::{Clock, ManualClock};
use fleetwatch_monitor::config::MonitorConfig;
use fleetwatch_monitor::dispatch::Dispatcher;
use fleetwatch_monitor::heartbeat::{HeartbeatRegistry, HeartbeatScheduler};
use fleetwatch_monitor::processor::{ProcessOutcome, StatusProcessor};
use fleetwatch_monitor::step::StepTimingRegistry;
use fleetwatch_monitor::sweep::SweepScheduler;
use fleetwatch_monitor::traffic::TrafficCounter;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPersistence {
    pub reports: Mutex<Vec<ReportRecord>>,
    pub exceptions: Mutex<Vec<(RecordId, String)>>,
    pub deaths: Mutex<Vec<NodeDeath>>,
    pub traffic: Mutex<Vec<TrafficSample>>,
    pub progress: Mutex<Vec<TaskProgress>>,
    pub fail: AtomicBool,
}

impl RecordingPersistence {
    fn check(&self) -> SinkResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(SinkError::Persistence("database unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceSink for RecordingPersistence {
    async fn record_report(&self, report: &ReportRecord) -> SinkResult<RecordId> {
        self.check()?;
        let mut reports = self.reports.lock().unwrap();
        reports.push(report.clone());
        Ok(reports.len() as RecordId)
    }

    async fn record_exception(&self, record_id: RecordId, exception: &str) -> SinkResult<()> {
        self.check()?;
        self.exceptions
            .lock()
            .unwrap()
            .push((record_id, exception.to_string()));
        Ok(())
    }

    async fn record_death(&self, death: &NodeDeath) -> SinkResult<()> {
        self.check()?;
        self.deaths.lock().unwrap().push(death.clone());
        Ok(())
    }

    async fn record_traffic(&self, sample: &TrafficSample) -> SinkResult<()> {
        self.check()?;
        self.traffic.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn record_progress(&self, progress: &TaskProgress) -> SinkResult<()> {
        self.check()?;
        self.progress.lock().unwrap().push(progress.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlerts {
    pub sent: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn notify(&self, alert: &Alert) -> SinkResult<()> {
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub struct RecordingTransport {
    pub subscribed: AtomicBool,
    pub published: Mutex<Vec<Bytes>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            subscribed: AtomicBool::new(true),
            published: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BroadcastTransport for RecordingTransport {
    async fn has_subscribers(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    async fn publish(&self, payload: Bytes) {
        self.published.lock().unwrap().push(payload);
    }
}

impl RecordingTransport {
    /// Everything published so far, as text.
    pub fn texts(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|b| String::from_utf8(b.to_vec()).expect("published events are UTF-8"))
            .collect()
    }

    /// Everything published so far, decoded as JSON.
    pub fn events(&self) -> Vec<Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|b| serde_json::from_slice(b).expect("published events are JSON"))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub fn start_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub heartbeats: Arc<HeartbeatRegistry>,
    pub sessions: Arc<StepTimingRegistry>,
    pub traffic: Arc<TrafficCounter>,
    pub persistence: Arc<RecordingPersistence>,
    pub alerts: Arc<RecordingAlerts>,
    pub transport: Arc<RecordingTransport>,
    pub processor: StatusProcessor,
    pub heartbeat_scheduler: HeartbeatScheduler,
    pub sweep_scheduler: SweepScheduler,
    tracker: TaskTracker,
    pump: BroadcastPump,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let heartbeats = Arc::new(HeartbeatRegistry::new());
        let sessions = Arc::new(StepTimingRegistry::new(config.terminal_step));
        let traffic = Arc::new(TrafficCounter::new(start_time()));

        let persistence = Arc::new(RecordingPersistence::default());
        let alerts = Arc::new(RecordingAlerts::default());
        let transport = Arc::new(RecordingTransport::default());

        let tracker = TaskTracker::new();
        let (broadcast, pump) = BroadcastSink::new(transport.clone(), 1024);
        let dispatch = Dispatcher::new(persistence.clone(), alerts.clone(), tracker.clone());

        let processor = StatusProcessor::new(
            heartbeats.clone(),
            sessions.clone(),
            traffic.clone(),
            broadcast.clone(),
            dispatch.clone(),
            dyn_clock.clone(),
        );
        let heartbeat_scheduler = HeartbeatScheduler::new(
            heartbeats.clone(),
            broadcast.clone(),
            dispatch.clone(),
            dyn_clock.clone(),
            config.heartbeat_interval(),
            config.dead_after_secs(),
        );
        let sweep_scheduler = SweepScheduler::new(
            sessions.clone(),
            traffic.clone(),
            broadcast,
            dispatch,
            dyn_clock,
            config.sweep_tick(),
            config.step_staleness_secs,
        );

        Self {
            clock,
            heartbeats,
            sessions,
            traffic,
            persistence,
            alerts,
            transport,
            processor,
            heartbeat_scheduler,
            sweep_scheduler,
            tracker,
            pump,
        }
    }

    pub async fn report(&self, json: Value) -> ProcessOutcome {
        self.processor.process(json.to_string().as_bytes()).await
    }

    pub async fn report_raw(&self, raw: &str) -> ProcessOutcome {
        self.processor.process(raw.as_bytes()).await
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance_secs(secs);
    }

    /// Wait for every detached collaborator call and deliver every queued
    /// broadcast. Returns the fakes for inspection.
    pub async fn finish(self) -> Recorded {
        let Harness {
            persistence,
            alerts,
            transport,
            processor,
            heartbeat_scheduler,
            sweep_scheduler,
            tracker,
            pump,
            ..
        } = self;

        drop(processor);
        drop(heartbeat_scheduler);
        drop(sweep_scheduler);

        tracker.close();
        tracker.wait().await;
        pump.run().await;

        Recorded {
            persistence,
            alerts,
            transport,
        }
    }
}

/// A harness whose schedulers run on their own timers.
pub struct RunningHarness {
    pub clock: Arc<ManualClock>,
    pub sessions: Arc<StepTimingRegistry>,
    pub persistence: Arc<RecordingPersistence>,
    pub alerts: Arc<RecordingAlerts>,
    pub transport: Arc<RecordingTransport>,
    pub processor: StatusProcessor,
    pub cancel: CancellationToken,
    pub loops: Vec<JoinHandle<()>>,
    tracker: TaskTracker,
    pump: JoinHandle<()>,
}

impl Harness {
    /// Spawn both scheduler loops and the broadcast pump.
    pub fn spawn_timers(self) -> RunningHarness {
        let cancel = CancellationToken::new();
        let loops = vec![
            tokio::spawn(self.heartbeat_scheduler.run(cancel.clone())),
            tokio::spawn(self.sweep_scheduler.run(cancel.clone())),
        ];

        RunningHarness {
            clock: self.clock,
            sessions: self.sessions,
            persistence: self.persistence,
            alerts: self.alerts,
            transport: self.transport,
            processor: self.processor,
            cancel,
            loops,
            tracker: self.tracker,
            pump: tokio::spawn(self.pump.run()),
        }
    }
}

impl RunningHarness {
    pub async fn report(&self, json: Value) -> ProcessOutcome {
        self.processor.process(json.to_string().as_bytes()).await
    }

    /// Cancel the loops and wait for everything they started.
    pub async fn stop(self) -> Recorded {
        self.cancel.cancel();
        for handle in self.loops {
            handle.await.expect("scheduler loop exits cleanly");
        }
        drop(self.processor);

        self.tracker.close();
        self.tracker.wait().await;
        self.pump.await.expect("pump exits cleanly");

        Recorded {
            persistence: self.persistence,
            alerts: self.alerts,
            transport: self.transport,
        }
    }
}

pub struct Recorded {
    pub persistence: Arc<RecordingPersistence>,
    pub alerts: Arc<RecordingAlerts>,
    pub transport: Arc<RecordingTransport>,
}

/// A report with task progress.
pub fn progress_report(node: &str, sid: &str, step: i64) -> Value {
    serde_json::json!({
        "pc_id": node,
        "ip": "10.0.0.1",
        "bank_name": "X",
        "exception": "",
        "bank_status": {"step": step, "sid": sid},
    })
}

/// A report without task progress.
pub fn heartbeat_report(node: &str) -> Value {
    serde_json::json!({
        "pc_id": node,
        "ip": "10.0.0.1",
        "bank_name": "X",
        "exception": "",
        "bank_status": null,
    })
}
