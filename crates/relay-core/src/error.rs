use thiserror::Error;

use crate::domain::{EventType, PromptState};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request queue is not running")]
    QueueClosed,

    #[error("session is not running")]
    SessionClosed,

    #[error("a prompt flow is already active (state={0})")]
    PromptInProgress(PromptState),

    #[error("decode failed for {event_type}: {source}")]
    Decode {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },

    #[error("queue snapshot io: {0}")]
    SnapshotIo(#[from] std::io::Error),

    #[error("queue snapshot encode: {0}")]
    SnapshotEncode(#[source] serde_json::Error),
}
