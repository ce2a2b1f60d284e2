//! Prompt-flow vocabulary: states, terminal results, UI steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::FeedbackResponse;

/// Where one feedback-prompt session currently is.
///
/// Transitions:
/// - `Idle -> CheckingEligibility` (prompt requested)
/// - `CheckingEligibility -> Eligible -> Showing` (backend said yes, UI asked to appear)
/// - `Showing -> Shown` (view confirmed the prompt is on screen)
/// - `Shown -> Dismissing -> Idle` (view reported the final UI state)
/// - any non-idle state `-> Idle` on failure fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptState {
    Idle,
    CheckingEligibility,
    Eligible,
    Showing,
    Shown,
    Dismissing,
}

impl PromptState {
    pub fn is_idle(self) -> bool {
        matches!(self, PromptState::Idle)
    }
}

impl fmt::Display for PromptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptState::Idle => "idle",
            PromptState::CheckingEligibility => "checkingEligibility",
            PromptState::Eligible => "eligible",
            PromptState::Showing => "showing",
            PromptState::Shown => "shown",
            PromptState::Dismissing => "dismissing",
        };
        f.write_str(name)
    }
}

/// Terminal classification handed to completion callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptResult {
    Cancelled,
    Completed,
    CompletedWithoutComment,
    RedirectedToStore,
    StoreReviewSkipped,
}

/// What the view should present next, per [`next_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptStep {
    Comment,
    StoreReview,
    RedirectToStore,
    ThankYou,
}

/// Final on-screen state the view reports when the prompt closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalUiState {
    Rating,
    Comment,
    ThankYou,
    StoreReview { redirected: bool },
}

/// Copy handed through to the presenter; the core never reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Routing rule for what follows a recorded rating.
///
/// - not positive, or a comment was requested: comment step
/// - positive, auto-redirect, store id known: redirect immediately
/// - positive, store id known, not automatic: store-review step
/// - otherwise: thank-you step
pub fn next_step(feedback: &FeedbackResponse) -> PromptStep {
    if !feedback.is_positive_rating || feedback.request_comment {
        return PromptStep::Comment;
    }
    if feedback.has_app_store_id() {
        if feedback.redirect_automatically {
            return PromptStep::RedirectToStore;
        }
        return PromptStep::StoreReview;
    }
    PromptStep::ThankYou
}
