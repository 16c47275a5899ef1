//! Bounded inbound queue of raw reports and the loop that drains it.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::processor::StatusProcessor;

/// Why a report could not be enqueued.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("Ingestion queue is full")]
    Full,

    #[error("Ingestion queue is closed")]
    Closed,
}

/// Producer handle for the ingestion queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReportSender {
    tx: mpsc::Sender<Bytes>,
}

impl ReportSender {
    /// Enqueue without waiting; fails with [`EnqueueError::Full`] when the
    /// queue is at capacity.
    pub fn try_enqueue(&self, raw: Bytes) -> Result<(), EnqueueError> {
        self.tx.try_send(raw).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Enqueue, waiting for capacity.
    pub async fn enqueue(&self, raw: Bytes) -> Result<(), EnqueueError> {
        self.tx.send(raw).await.map_err(|_| EnqueueError::Closed)
    }

    /// Free slots left in the queue.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// The consumer side of the ingestion queue.
pub struct IngestionQueue {
    rx: mpsc::Receiver<Bytes>,
}

impl IngestionQueue {
    /// Create a queue holding at most `capacity` raw reports.
    pub fn bounded(capacity: usize) -> (ReportSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (ReportSender { tx }, Self { rx })
    }

    /// Drain the queue, processing every report on its own task.
    ///
    /// On cancellation the queue stops accepting reports and everything
    /// already buffered is still dispatched. Report tasks are spawned on
    /// `tracker` so the caller can wait for them to finish.
    pub async fn run(
        mut self,
        processor: Arc<StatusProcessor>,
        tracker: TaskTracker,
        cancel: CancellationToken,
    ) {
        tracing::info!("Report consumer started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.rx.close();
                    break;
                }
                raw = self.rx.recv() => match raw {
                    Some(raw) => dispatch(&processor, &tracker, raw),
                    None => break,
                }
            }
        }

        let mut drained = 0usize;
        while let Some(raw) = self.rx.recv().await {
            dispatch(&processor, &tracker, raw);
            drained += 1;
        }

        tracing::info!(drained, "Report consumer stopped");
    }
}

fn dispatch(processor: &Arc<StatusProcessor>, tracker: &TaskTracker, raw: Bytes) {
    let processor = Arc::clone(processor);
    tracker.spawn(async move {
        processor.process(&raw).await;
    });
}
