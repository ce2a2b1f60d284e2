//! Domain model: request descriptions, outcomes, failures, and the
//! prompt-flow vocabulary.

mod failure;
mod ids;
mod prompt;
mod request;
mod responses;
mod result;

pub use failure::QueueFailure;
pub use ids::RequestId;
pub use prompt::{
    FinalUiState, PromptConfig, PromptResult, PromptState, PromptStep, next_step,
};
pub use request::{EventType, HttpMethod, QueuedRequest};
pub use responses::{
    EligibilityResponse, FeedbackResponse, PromptEventResponse, PromptEventStatus,
};
pub use result::{QueuedRequestResult, RequestOutcome};
