#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use fleetwatch_monitor::heartbeat::HeartbeatRegistry;
use fleetwatch_monitor::ingest::{IngestionQueue, ReportSender};
use fleetwatch_monitor::step::StepTimingRegistry;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use fleetwatch_api::config::ServerConfig;
use fleetwatch_api::router::build_app_router;
use fleetwatch_api::state::AppState;
use fleetwatch_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..ServerConfig::default()
    }
}

/// A pool that never connects unless a query runs. For routes that do not
/// touch the database.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://fleetwatch@localhost/fleetwatch_test")
        .expect("valid database url")
}

/// Everything a test needs to drive the app and inspect its state.
pub struct TestApp {
    pub app: Router,
    pub heartbeats: Arc<HeartbeatRegistry>,
    pub sessions: Arc<StepTimingRegistry>,
    pub ws_manager: Arc<WsManager>,
    pub sender: ReportSender,
    /// Held so the queue stays open; never drained.
    pub queue: IngestionQueue,
}

/// Build the full application router over an undrained queue of
/// `queue_capacity` reports.
pub fn build_test_app(pool: PgPool, queue_capacity: usize) -> TestApp {
    let config = test_config();
    let (sender, queue) = IngestionQueue::bounded(queue_capacity);
    let heartbeats = Arc::new(HeartbeatRegistry::new());
    let sessions = Arc::new(StepTimingRegistry::new(6));
    let ws_manager = Arc::new(WsManager::new(config.subscriber_buffer));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        reports: sender.clone(),
        heartbeats: Arc::clone(&heartbeats),
        sessions: Arc::clone(&sessions),
    };

    TestApp {
        app: build_app_router(state, &config),
        heartbeats,
        sessions,
        ws_manager,
        sender,
        queue,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
