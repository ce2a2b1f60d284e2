//! Request descriptions: the unit of work the queue delivers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RequestId;

/// HTTP-like method of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag that selects which decoder/handler applies to a request's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    CheckPromptEligibility,
    SendPromptEvent,
    SendFeedbackEvent,
    SendFeedbackComment,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::CheckPromptEligibility => "checkPromptEligibility",
            EventType::SendPromptEvent => "sendPromptEvent",
            EventType::SendFeedbackEvent => "sendFeedbackEvent",
            EventType::SendFeedbackComment => "sendFeedbackComment",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one outbound operation awaiting execution.
///
/// Lifecycle: built by a request builder, appended to the queue tail, removed
/// from the head for execution, then either resolved for good or replaced at
/// the head by a copy with `retry_count + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    id: RequestId,
    method: HttpMethod,
    path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Vec<u8>>,
    event_type: EventType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
    retry_count: u32,
    enqueued_at: DateTime<Utc>,
}

impl QueuedRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>, event_type: EventType) -> Self {
        Self {
            id: RequestId::generate(),
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            event_type,
            metadata: BTreeMap::new(),
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Attempts already recorded against this request (0 on first delivery).
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// The copy that replaces this request after a failed attempt: same
    /// identity, bumped retry count.
    pub fn bump_retry(mut self) -> Self {
        self.retry_count += 1;
        self
    }
}
