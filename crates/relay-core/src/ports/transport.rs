//! Transport port: turns a request description into bytes on the wire.

use async_trait::async_trait;

use crate::domain::{QueueFailure, QueuedRequest};

/// Executes one request.
///
/// Implementations map transport-level errors and non-2xx responses into
/// [`QueueFailure`] with status/url/body snippet populated where available.
/// Timeouts belong here; the queue adds none of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &QueuedRequest) -> Result<Vec<u8>, QueueFailure>;
}
