//! Backend response payloads the session decodes from queue results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend decision on whether the current user should be asked for feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub id: String,
    pub eligible: bool,
}

/// Status attached to a prompt lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptEventStatus {
    PromptShown,
    PromptDismissed,
    PromptDismissedAfterRating,
    RedirectedToStore,
    StoreReviewSkipped,
}

impl PromptEventStatus {
    /// Statuses that end the prompt's on-screen life.
    pub fn is_dismissal(self) -> bool {
        matches!(
            self,
            PromptEventStatus::PromptDismissed | PromptEventStatus::PromptDismissedAfterRating
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptEventStatus::PromptShown => "promptShown",
            PromptEventStatus::PromptDismissed => "promptDismissed",
            PromptEventStatus::PromptDismissedAfterRating => "promptDismissedAfterRating",
            PromptEventStatus::RedirectedToStore => "redirectedToStore",
            PromptEventStatus::StoreReviewSkipped => "storeReviewSkipped",
        }
    }
}

impl fmt::Display for PromptEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledged prompt lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEventResponse {
    pub id: String,
    pub status: PromptEventStatus,
}

/// Recorded user feedback plus the routing flags the presentation rule needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub is_positive_rating: bool,
    #[serde(default)]
    pub request_comment: bool,
    #[serde(default)]
    pub redirect_automatically: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store_id: Option<String>,
}

impl FeedbackResponse {
    pub fn has_app_store_id(&self) -> bool {
        self.app_store_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}
