//! Queue snapshot persistence.
//!
//! The pending queue is one JSON array in one file. Loading tolerates a
//! missing or corrupt file (fresh install, torn write) by starting empty.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::QueuedRequest;
use crate::error::RelayError;
use crate::ports::QueueStore;

/// Snapshot store backed by a single JSON file.
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn load(&self) -> Vec<QueuedRequest> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(pending) => pending,
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "queue snapshot unreadable, starting empty"
                );
                Vec::new()
            }
        }
    }

    async fn persist(&self, pending: &[QueuedRequest]) -> Result<(), RelayError> {
        let bytes = serde_json::to_vec(pending).map_err(RelayError::SnapshotEncode)?;
        // Write-then-rename keeps a torn write from corrupting the snapshot.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-process store for hosts without a durable location, and for tests.
#[derive(Default)]
pub struct MemoryQueueStore {
    pending: Mutex<Vec<QueuedRequest>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn load(&self) -> Vec<QueuedRequest> {
        self.pending.lock().await.clone()
    }

    async fn persist(&self, pending: &[QueuedRequest]) -> Result<(), RelayError> {
        *self.pending.lock().await = pending.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, HttpMethod};

    fn requests(n: usize) -> Vec<QueuedRequest> {
        (0..n)
            .map(|i| {
                QueuedRequest::new(
                    HttpMethod::Post,
                    format!("/v1/feedback/events/{i}"),
                    EventType::SendPromptEvent,
                )
                .with_header("content-type", "application/json")
                .with_body(format!(r#"{{"n":{i}}}"#).into_bytes())
            })
            .collect()
    }

    #[tokio::test]
    async fn snapshot_roundtrips_items_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));

        let pending = requests(5);
        store.persist(&pending).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, pending);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        tokio::fs::write(&path, b"{ not an array").await.unwrap();

        let store = FileQueueStore::new(path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn persist_replaces_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));

        store.persist(&requests(3)).await.unwrap();
        let shorter = requests(1);
        store.persist(&shorter).await.unwrap();

        assert_eq!(store.load().await, shorter);
    }
}
