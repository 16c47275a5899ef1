//! Best-effort fan-out of derived events to live subscribers.
//!
//! [`BroadcastSink`] is the producer side: it never waits. Events are
//! discarded when nobody is subscribed and dropped with a warning when the
//! outbound queue is full. [`BroadcastPump`] drains the queue into the
//! [`BroadcastTransport`] on its own task.

use std::sync::Arc;

use bytes::Bytes;
use fleetwatch_core::sinks::BroadcastTransport;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// What happened to an event handed to [`BroadcastSink::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// Nobody was subscribed; the event was discarded.
    NoSubscribers,
    /// The outbound queue was full or closed; the event was dropped.
    Dropped,
}

/// Non-blocking handle for publishing events. Cheap to clone.
#[derive(Clone)]
pub struct BroadcastSink {
    transport: Arc<dyn BroadcastTransport>,
    queue: mpsc::Sender<Bytes>,
}

impl BroadcastSink {
    /// Create a sink with an outbound queue of `capacity` events and the
    /// pump that drains it.
    pub fn new(transport: Arc<dyn BroadcastTransport>, capacity: usize) -> (Self, BroadcastPump) {
        let (queue, rx) = mpsc::channel(capacity);
        let pump = BroadcastPump {
            transport: Arc::clone(&transport),
            rx,
        };
        (Self { transport, queue }, pump)
    }

    /// Offer an event to subscribers without waiting for delivery.
    pub async fn send(&self, payload: Bytes) -> SendOutcome {
        if !self.transport.has_subscribers().await {
            return SendOutcome::NoSubscribers;
        }

        match self.queue.try_send(payload) {
            Ok(()) => SendOutcome::Queued,
            Err(TrySendError::Full(payload)) => {
                tracing::warn!(
                    payload = %String::from_utf8_lossy(&payload),
                    "Broadcast queue full, dropping event",
                );
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Broadcast pump stopped, dropping event");
                SendOutcome::Dropped
            }
        }
    }
}

/// Forwards queued events to the transport.
pub struct BroadcastPump {
    transport: Arc<dyn BroadcastTransport>,
    rx: mpsc::Receiver<Bytes>,
}

impl BroadcastPump {
    /// Run until every [`BroadcastSink`] clone has been dropped.
    pub async fn run(mut self) {
        while let Some(payload) = self.rx.recv().await {
            self.transport.publish(payload).await;
        }
        tracing::debug!("Broadcast pump stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
