use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::extract::ws::Message;
use bytes::Bytes;
use fleetwatch_core::sinks::BroadcastTransport;
use fleetwatch_core::types::Timestamp;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Events a subscriber may fall behind by when no capacity is configured.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Metadata for a single subscriber connection.
pub struct WsConnection {
    sender: mpsc::Sender<Message>,
    connected_at: Timestamp,
    /// Events dropped because this subscriber's queue was full.
    dropped: AtomicU64,
}

impl WsConnection {
    /// Queue `message` without waiting. A full queue drops it. Returns
    /// whether the message was queued.
    fn offer(&self, conn_id: &str, message: Message) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(conn_id, dropped, "Subscriber queue full, dropping message");
                false
            }
            // The socket task is gone; `remove` follows shortly.
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Manages all subscriber WebSocket connections.
///
/// Each subscriber has a bounded queue drained by its socket task. A slow
/// subscriber loses messages instead of holding memory or delaying the
/// others. Doubles as the monitor's [`BroadcastTransport`].
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
    buffer: usize,
}

impl WsManager {
    /// Create an empty manager whose subscribers each queue up to `buffer`
    /// messages.
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message queue so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
            dropped: AtomicU64::new(0),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.remove(conn_id) {
            let connected_secs = (chrono::Utc::now() - conn.connected_at).num_seconds();
            let dropped = conn.dropped.load(Ordering::Relaxed);
            tracing::debug!(conn_id, connected_secs, dropped, "Subscriber removed");
        }
    }

    /// Offer a message to every subscriber. Returns how many queued it.
    pub async fn broadcast(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .iter()
            .filter(|(id, conn)| conn.offer(id, message.clone()))
            .count()
    }

    /// Number of messages dropped for `conn_id` so far.
    pub async fn dropped_for(&self, conn_id: &str) -> Option<u64> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .map(|conn| conn.dropped.load(Ordering::Relaxed))
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for (id, conn) in conns.iter() {
            conn.offer(id, Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        self.broadcast(Message::Ping(Bytes::new())).await;
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

#[async_trait]
impl BroadcastTransport for WsManager {
    async fn has_subscribers(&self) -> bool {
        self.connection_count().await > 0
    }

    /// Events are JSON, so they go out as text frames.
    async fn publish(&self, payload: Bytes) {
        let message = match String::from_utf8(payload.to_vec()) {
            Ok(text) => Message::Text(text.into()),
            Err(_) => Message::Binary(payload),
        };
        self.broadcast(message).await;
    }
}
