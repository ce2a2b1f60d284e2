//! Results broadcast by the queue.

use serde::{Deserialize, Serialize};

use super::{EventType, QueueFailure};

/// Raw outcome of one executed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RequestOutcome {
    Success(Vec<u8>),
    Failure(QueueFailure),
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }
}

/// The only payload subscribers ever receive.
///
/// A failed attempt that will be retried is flagged with `will_retry`;
/// listeners that only care about the final word per enqueue filter on
/// [`QueuedRequestResult::is_terminal`]. The terminal outcome of a request is
/// broadcast exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequestResult {
    pub event_type: EventType,
    /// Retries already recorded when this attempt ran (0 for the first try).
    pub retry_count: u32,
    pub will_retry: bool,
    pub outcome: RequestOutcome,
}

impl QueuedRequestResult {
    pub fn success(event_type: EventType, retry_count: u32, bytes: Vec<u8>) -> Self {
        Self {
            event_type,
            retry_count,
            will_retry: false,
            outcome: RequestOutcome::Success(bytes),
        }
    }

    pub fn failure(
        event_type: EventType,
        retry_count: u32,
        failure: QueueFailure,
        will_retry: bool,
    ) -> Self {
        Self {
            event_type,
            retry_count,
            will_retry,
            outcome: RequestOutcome::Failure(failure),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.will_retry
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_always_terminal() {
        let result =
            QueuedRequestResult::success(EventType::SendPromptEvent, 2, b"{}".to_vec());
        assert!(result.is_terminal());
        assert!(result.is_success());
    }

    #[test]
    fn flagged_failure_is_not_terminal() {
        let result = QueuedRequestResult::failure(
            EventType::SendPromptEvent,
            0,
            QueueFailure::transport("socket closed"),
            true,
        );
        assert!(!result.is_terminal());
        assert!(!result.is_success());
    }
}
