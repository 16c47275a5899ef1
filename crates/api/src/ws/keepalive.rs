use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

/// Ping subscriber sockets every `period` until `cancel` fires.
///
/// Transport keep-alive only; node liveness belongs to the monitor. Ticks
/// with no subscribers send nothing.
pub fn start_keepalive(
    ws_manager: Arc<WsManager>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let count = ws_manager.connection_count().await;
                    if count > 0 {
                        tracing::trace!(count, "Pinging subscribers");
                        ws_manager.ping_all().await;
                    }
                }
            }
        }

        tracing::debug!("Keep-alive stopped");
    })
}
