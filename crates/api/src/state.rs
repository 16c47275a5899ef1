use std::sync::Arc;

use fleetwatch_monitor::heartbeat::HeartbeatRegistry;
use fleetwatch_monitor::ingest::ReportSender;
use fleetwatch_monitor::step::StepTimingRegistry;
use fleetwatch_monitor::Monitor;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fleetwatch_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Subscriber WebSocket connections; also the monitor's broadcast transport.
    pub ws_manager: Arc<WsManager>,
    /// Producer side of the monitor's ingestion queue.
    pub reports: ReportSender,
    pub heartbeats: Arc<HeartbeatRegistry>,
    pub sessions: Arc<StepTimingRegistry>,
}

impl AppState {
    /// State wired to a running [`Monitor`].
    pub fn new(
        pool: fleetwatch_db::DbPool,
        config: Arc<ServerConfig>,
        ws_manager: Arc<WsManager>,
        monitor: &Monitor,
    ) -> Self {
        Self {
            pool,
            config,
            ws_manager,
            reports: monitor.sender(),
            heartbeats: Arc::clone(monitor.heartbeats()),
            sessions: Arc::clone(monitor.sessions()),
        }
    }
}
