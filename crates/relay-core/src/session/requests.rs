//! Builders for the session's outbound requests.
//!
//! Bodies are JSON with camelCase keys, matching the tag vocabulary the
//! backend decoders use.

use std::collections::BTreeMap;

use serde_json::json;

use crate::domain::{EventType, HttpMethod, PromptEventStatus, QueuedRequest};

const ELIGIBILITY_PATH: &str = "/v1/feedback/eligibility";
const PROMPT_EVENTS_PATH: &str = "/v1/feedback/events";
const FEEDBACK_PATH: &str = "/v1/feedback/responses";

fn json_request(
    method: HttpMethod,
    path: &str,
    event_type: EventType,
    body: serde_json::Value,
    metadata: BTreeMap<String, String>,
) -> QueuedRequest {
    QueuedRequest::new(method, path, event_type)
        .with_header("content-type", "application/json")
        .with_body(body.to_string().into_bytes())
        .with_metadata(metadata)
}

pub(super) fn check_eligibility(metadata: &BTreeMap<String, String>) -> QueuedRequest {
    let body = json!({ "metadata": metadata });
    json_request(
        HttpMethod::Post,
        ELIGIBILITY_PATH,
        EventType::CheckPromptEligibility,
        body,
        metadata.clone(),
    )
}

pub(super) fn prompt_event(
    status: PromptEventStatus,
    parent_id: &str,
    metadata: &BTreeMap<String, String>,
) -> QueuedRequest {
    let body = json!({
        "parentId": parent_id,
        "status": status,
        "metadata": metadata,
    });
    json_request(
        HttpMethod::Post,
        PROMPT_EVENTS_PATH,
        EventType::SendPromptEvent,
        body,
        metadata.clone(),
    )
}

pub(super) fn user_feedback(
    prompt_event_id: &str,
    rating: u8,
    comment: Option<&str>,
    metadata: &BTreeMap<String, String>,
) -> QueuedRequest {
    let body = json!({
        "promptEventId": prompt_event_id,
        "rating": rating,
        "comment": comment,
        "metadata": metadata,
    });
    json_request(
        HttpMethod::Post,
        FEEDBACK_PATH,
        EventType::SendFeedbackEvent,
        body,
        metadata.clone(),
    )
}

pub(super) fn user_comment(feedback_id: &str, comment: &str) -> QueuedRequest {
    let body = json!({
        "feedbackId": feedback_id,
        "comment": comment,
    });
    json_request(
        HttpMethod::Put,
        FEEDBACK_PATH,
        EventType::SendFeedbackComment,
        body,
        BTreeMap::new(),
    )
}
