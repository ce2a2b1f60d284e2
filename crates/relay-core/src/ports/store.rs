//! Persistence port for the pending-queue snapshot.

use async_trait::async_trait;

use crate::domain::QueuedRequest;
use crate::error::RelayError;

/// Stores the ordered pending queue.
///
/// Writes are best-effort: the queue logs persistence failures and keeps
/// going, so implementations should return errors rather than panic.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Initial queue contents. Absence or corruption yields an empty queue,
    /// never a hard failure.
    async fn load(&self) -> Vec<QueuedRequest>;

    async fn persist(&self, pending: &[QueuedRequest]) -> Result<(), RelayError>;
}
