//! Normalized execution failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest response-body snippet kept for diagnostics.
const MAX_SNIPPET_CHARS: usize = 512;

/// Normalized, diagnostics-rich form of any execution failure.
///
/// Produced whenever the transport errors out or returns a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response body truncated at construction, never the full payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_snippet: Option<String>,
}

impl QueueFailure {
    /// A transport-level failure (connection refused, DNS, TLS, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            url: None,
            status: None,
            body_snippet: None,
        }
    }

    /// A non-2xx HTTP response.
    pub fn http(status: u16, url: impl Into<String>, body: &str) -> Self {
        Self {
            code: None,
            message: format!("server returned status {status}"),
            url: Some(url.into()),
            status: Some(status),
            body_snippet: snippet(body),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for QueueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status={status})")?;
        }
        if let Some(url) = &self.url {
            write!(f, " [{url}]")?;
        }
        Ok(())
    }
}

fn snippet(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_SNIPPET_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_failure_keeps_status_and_snippet() {
        let failure = QueueFailure::http(503, "https://api.example.com/v1/x", "try later");
        assert_eq!(failure.status, Some(503));
        assert_eq!(failure.body_snippet.as_deref(), Some("try later"));
        assert!(failure.to_string().contains("503"));
    }

    #[test]
    fn snippet_is_truncated_to_limit() {
        let body = "x".repeat(2000);
        let failure = QueueFailure::http(500, "https://api.example.com", &body);
        assert_eq!(failure.body_snippet.unwrap().chars().count(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn empty_body_yields_no_snippet() {
        let failure = QueueFailure::http(502, "https://api.example.com", "  ");
        assert!(failure.body_snippet.is_none());
    }
}
