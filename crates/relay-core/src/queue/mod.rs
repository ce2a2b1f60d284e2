//! Durable retry queue: FIFO single-flight delivery with backoff retries.
//!
//! Contract:
//! - `enqueue` appends to the tail, persists the snapshot, and kicks the
//!   drain; it never waits on network I/O.
//! - `configure` opens the tap once credentials are known; idempotent.
//! - `subscribe` returns an independent, ordered, unbounded stream of
//!   results; every subscriber sees every broadcast from the moment it
//!   subscribed.
//! - Retries rejoin at the **head** after a jittered backoff, cutting ahead
//!   of newer work to bound the staleness of retried writes.

mod actor;
mod retry;
mod snapshot;

pub use retry::RetryPolicy;
pub use snapshot::{FileQueueStore, MemoryQueueStore};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::domain::{QueuedRequest, QueuedRequestResult};
use crate::error::RelayError;
use crate::ports::{QueueStore, Transport};

use actor::{QueueActor, QueueCommand};

/// Command channel depth; enqueue bursts beyond this briefly await the actor.
const CHANNEL_CAPACITY: usize = 64;

/// Cheap-to-clone handle to the queue actor.
#[derive(Clone)]
pub struct RequestQueue {
    tx: mpsc::Sender<QueueCommand>,
}

impl RequestQueue {
    /// Spawn the queue actor. The persisted snapshot (if any) becomes the
    /// initial pending list; nothing drains until [`RequestQueue::configure`].
    pub fn spawn(
        transport: Arc<dyn Transport>,
        store: Arc<dyn QueueStore>,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let actor = QueueActor::new(transport, store, policy, rx, tx.clone());
        tokio::spawn(actor.run());
        Self { tx }
    }

    /// Append a request to the tail and persist the new snapshot.
    ///
    /// Resolves once the append and the persist attempt finished; execution
    /// happens later, off this call path.
    pub async fn enqueue(&self, request: QueuedRequest) -> Result<(), RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(QueueCommand::Enqueue {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::QueueClosed)?;
        reply_rx.await.map_err(|_| RelayError::QueueClosed)
    }

    /// Allow the queue to start draining. Safe to call repeatedly.
    pub async fn configure(&self) -> Result<(), RelayError> {
        self.tx
            .send(QueueCommand::Configure)
            .await
            .map_err(|_| RelayError::QueueClosed)
    }

    /// Independent, ordered stream of every result broadcast from this
    /// moment on. Dropping the receiver unsubscribes without affecting
    /// other listeners.
    pub async fn subscribe(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<QueuedRequestResult>, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(QueueCommand::Subscribe { reply: reply_tx })
            .await
            .map_err(|_| RelayError::QueueClosed)?;
        reply_rx.await.map_err(|_| RelayError::QueueClosed)
    }

    /// Queue depth and flags, for diagnostics and tests.
    pub async fn status(&self) -> Result<QueueStatus, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(QueueCommand::Status { reply: reply_tx })
            .await
            .map_err(|_| RelayError::QueueClosed)?;
        reply_rx.await.map_err(|_| RelayError::QueueClosed)
    }
}

/// Point-in-time queue counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub processing: bool,
    pub configured: bool,
}
