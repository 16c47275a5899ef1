use std::sync::Arc;

use fleetwatch_db::PgPersistenceSink;
use fleetwatch_monitor::clock::SystemClock;
use fleetwatch_monitor::{Collaborators, Monitor, MonitorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetwatch_api::config::ServerConfig;
use fleetwatch_api::router::build_app_router;
use fleetwatch_api::state::AppState;
use fleetwatch_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fleetwatch_api=debug,fleetwatch_monitor=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        addr = %config.bind_addr,
        subscriber_buffer = config.subscriber_buffer,
        "Loaded server configuration",
    );

    let monitor_config = MonitorConfig::from_env();
    monitor_config
        .validate()
        .expect("Invalid monitor configuration");
    tracing::info!(
        heartbeat_interval_secs = monitor_config.heartbeat_interval_secs,
        dead_threshold_minutes = monitor_config.dead_threshold_minutes,
        "Loaded monitor configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = fleetwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fleetwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    fleetwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new(config.subscriber_buffer));

    // --- Monitor ---
    let monitor = Monitor::start(
        &monitor_config,
        Collaborators {
            persistence: Arc::new(PgPersistenceSink::new(pool.clone())),
            alerts: fleetwatch_events::alert_sink_from_env(),
            transport: ws_manager.clone(),
        },
        Arc::new(SystemClock),
    );

    // Pings stop as soon as the monitor begins shutting down.
    let keepalive_handle = ws::start_keepalive(
        Arc::clone(&ws_manager),
        config.ping_interval,
        monitor.cancellation_token(),
    );

    // --- App state ---
    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::clone(&ws_manager),
        &monitor,
    );

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = config.bind_addr;
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining monitor");

    // Buffered reports are processed and their events broadcast before the
    // subscriber sockets are closed.
    if tokio::time::timeout(config.shutdown_timeout, monitor.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "Monitor drain timed out",
        );
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    if let Err(e) = keepalive_handle.await {
        tracing::error!(error = %e, "Keep-alive task failed");
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
