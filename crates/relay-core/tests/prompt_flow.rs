//! End-to-end prompt-flow scenarios over a scripted transport.
//!
//! Paused time keeps the backoff paths fast and makes the actor interleaving
//! deterministic: sleeping in the test lets every other task drain first.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use relay_core::domain::{
    EventType, FinalUiState, PromptConfig, PromptResult, PromptState, PromptStep, QueueFailure,
    QueuedRequest, QueuedRequestResult,
};
use relay_core::error::RelayError;
use relay_core::ports::{Presenter, Transport};
use relay_core::queue::{MemoryQueueStore, RequestQueue, RetryPolicy};
use relay_core::session::{SessionController, SessionSignal};

/// Long enough for paused time to run everything else to quiescence.
const SETTLE: Duration = Duration::from_millis(20);

type Script = dyn Fn(&QueuedRequest) -> Result<Vec<u8>, QueueFailure> + Send + Sync;

struct ScriptedTransport {
    script: Box<Script>,
    log: Mutex<Vec<QueuedRequest>>,
}

impl ScriptedTransport {
    fn new(
        script: impl Fn(&QueuedRequest) -> Result<Vec<u8>, QueueFailure> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            log: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<QueuedRequest> {
        self.log.lock().unwrap().clone()
    }

    fn bodies(&self, event_type: EventType) -> Vec<serde_json::Value> {
        self.requests()
            .iter()
            .filter(|r| r.event_type() == event_type)
            .map(|r| serde_json::from_slice(r.body().expect("request body")).unwrap())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &QueuedRequest) -> Result<Vec<u8>, QueueFailure> {
        self.log.lock().unwrap().push(request.clone());
        (self.script)(request)
    }
}

struct ChannelPresenter {
    shows: mpsc::UnboundedSender<PromptConfig>,
    dismissals: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl Presenter for ChannelPresenter {
    async fn show(&self, config: &PromptConfig) {
        let _ = self.shows.send(config.clone());
    }

    async fn dismiss(&self) {
        let _ = self.dismissals.send(());
    }
}

struct Harness {
    transport: Arc<ScriptedTransport>,
    queue: RequestQueue,
    session: SessionController,
    signals: mpsc::UnboundedReceiver<SessionSignal>,
    results: mpsc::UnboundedReceiver<QueuedRequestResult>,
    shows: mpsc::UnboundedReceiver<PromptConfig>,
    dismissals: mpsc::UnboundedReceiver<()>,
}

async fn harness(
    script: impl Fn(&QueuedRequest) -> Result<Vec<u8>, QueueFailure> + Send + Sync + 'static,
) -> Harness {
    let transport = ScriptedTransport::new(script);
    let queue = RequestQueue::spawn(
        transport.clone(),
        Arc::new(MemoryQueueStore::new()),
        RetryPolicy::default(),
    );
    queue.configure().await.unwrap();
    let results = queue.subscribe().await.unwrap();

    let (shows_tx, shows) = mpsc::unbounded_channel();
    let (dismiss_tx, dismissals) = mpsc::unbounded_channel();
    let presenter = Arc::new(ChannelPresenter {
        shows: shows_tx,
        dismissals: dismiss_tx,
    });

    let session = SessionController::spawn(queue.clone(), presenter)
        .await
        .unwrap();
    let signals = session.observe().await.unwrap();

    Harness {
        transport,
        queue,
        session,
        signals,
        results,
        shows,
        dismissals,
    }
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}

/// Await the terminal result of the given event type, then let the session
/// actor apply it too.
async fn await_ack(h: &mut Harness, event_type: EventType) -> QueuedRequestResult {
    loop {
        let result = recv(&mut h.results).await;
        if result.event_type == event_type && result.is_terminal() {
            tokio::time::sleep(SETTLE).await;
            return result;
        }
    }
}

fn bytes(value: serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Script where eligibility passes, prompt events are acked with an echoed
/// status, and feedback comes back with the given routing flags.
fn flow_script(
    feedback: serde_json::Value,
) -> impl Fn(&QueuedRequest) -> Result<Vec<u8>, QueueFailure> {
    move |request| match request.event_type() {
        EventType::CheckPromptEligibility => {
            Ok(bytes(json!({ "id": "elig-1", "eligible": true })))
        }
        EventType::SendPromptEvent => {
            let body: serde_json::Value =
                serde_json::from_slice(request.body().expect("body")).unwrap();
            Ok(bytes(json!({ "id": "pe-1", "status": body["status"] })))
        }
        EventType::SendFeedbackEvent | EventType::SendFeedbackComment => {
            Ok(bytes(feedback.clone()))
        }
    }
}

fn metadata() -> BTreeMap<String, String> {
    BTreeMap::from([("appVersion".to_string(), "3.2.0".to_string())])
}

fn config() -> PromptConfig {
    PromptConfig {
        title: Some("Enjoying the app?".to_string()),
        message: None,
    }
}

/// Drive an eligible flow up to the point where the prompt is on screen and
/// the promptShown event has been acknowledged.
async fn drive_to_shown(h: &mut Harness) -> tokio::sync::oneshot::Receiver<PromptResult> {
    let done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();

    let shown_config = recv(&mut h.shows).await;
    assert_eq!(shown_config.title.as_deref(), Some("Enjoying the app?"));
    assert_eq!(h.session.state().await.unwrap(), PromptState::Showing);

    h.session.log_prompt_shown().await.unwrap();
    assert_eq!(h.session.state().await.unwrap(), PromptState::Shown);
    await_ack(h, EventType::SendPromptEvent).await;
    done
}

#[tokio::test(start_paused = true)]
async fn happy_path_prompt_shown_references_the_eligibility() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1", "isPositiveRating": true
    })))
    .await;

    drive_to_shown(&mut h).await;

    let shown = &h.transport.bodies(EventType::SendPromptEvent)[0];
    assert_eq!(shown["status"], "promptShown");
    assert_eq!(shown["parentId"], "elig-1");
    assert_eq!(shown["metadata"]["appVersion"], "3.2.0");

    // Everything acknowledged; nothing left waiting in the queue.
    let status = h.queue.status().await.unwrap();
    assert_eq!(status.pending, 0);
    assert!(!status.processing);
}

#[tokio::test(start_paused = true)]
async fn second_prompt_request_is_rejected_while_a_flow_is_active() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1", "isPositiveRating": true
    })))
    .await;

    let _done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();
    let rejected = h.session.prompt_for_review(metadata(), config()).await;
    assert!(matches!(rejected, Err(RelayError::PromptInProgress(_))));

    // The first flow is untouched and exactly one eligibility check ran.
    recv(&mut h.shows).await;
    let checks = h.transport.bodies(EventType::CheckPromptEligibility);
    assert_eq!(checks.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn denied_eligibility_settles_cancelled_without_ui() {
    let mut h = harness(|request| match request.event_type() {
        EventType::CheckPromptEligibility => {
            Ok(bytes(json!({ "id": "elig-1", "eligible": false })))
        }
        other => panic!("unexpected request: {other}"),
    })
    .await;

    let done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();

    assert_eq!(done.await.unwrap(), PromptResult::Cancelled);
    assert_eq!(h.session.state().await.unwrap(), PromptState::Idle);
    assert!(h.shows.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn eligibility_failure_falls_back_to_idle_after_retries() {
    let mut h = harness(|request| match request.event_type() {
        EventType::CheckPromptEligibility => {
            Err(QueueFailure::http(500, "https://api.example.com", "boom"))
        }
        other => panic!("unexpected request: {other}"),
    })
    .await;

    let done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();

    assert_eq!(done.await.unwrap(), PromptResult::Cancelled);
    match recv(&mut h.signals).await {
        SessionSignal::Error { event_type, .. } => {
            assert_eq!(event_type, EventType::CheckPromptEligibility);
        }
        other => panic!("expected an error signal, got {other:?}"),
    }
    assert_eq!(h.session.state().await.unwrap(), PromptState::Idle);

    // The whole retry budget was spent before giving up.
    let checks = h.transport.bodies(EventType::CheckPromptEligibility);
    assert_eq!(checks.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn positive_rating_with_auto_redirect_skips_the_comment_step() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1",
        "isPositiveRating": true,
        "requestComment": false,
        "redirectAutomatically": true,
        "appStoreId": "12345"
    })))
    .await;

    let done = drive_to_shown(&mut h).await;

    h.session.log_user_feedback(5, None).await.unwrap();
    assert_eq!(
        recv(&mut h.signals).await,
        SessionSignal::StepAdvanced(PromptStep::RedirectToStore)
    );

    // The view performed the redirect and closes the prompt.
    h.session
        .dismiss_prompt(FinalUiState::StoreReview { redirected: true })
        .await
        .unwrap();
    recv(&mut h.dismissals).await;
    assert_eq!(done.await.unwrap(), PromptResult::RedirectedToStore);

    let feedback = &h.transport.bodies(EventType::SendFeedbackEvent)[0];
    assert_eq!(feedback["promptEventId"], "pe-1");
    assert_eq!(feedback["rating"], 5);

    await_ack(&mut h, EventType::SendPromptEvent).await;
    let statuses: Vec<String> = h
        .transport
        .bodies(EventType::SendPromptEvent)
        .iter()
        .map(|b| b["status"].as_str().unwrap().to_string())
        .collect();
    assert!(statuses.contains(&"redirectedToStore".to_string()));
}

#[tokio::test(start_paused = true)]
async fn negative_rating_routes_to_comment_then_thank_you() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1",
        "isPositiveRating": false,
        "redirectAutomatically": true,
        "appStoreId": "12345"
    })))
    .await;

    let done = drive_to_shown(&mut h).await;

    h.session
        .log_user_feedback(2, Some("slow sync".to_string()))
        .await
        .unwrap();
    // A negative rating goes to the comment step no matter what else is set.
    assert_eq!(
        recv(&mut h.signals).await,
        SessionSignal::StepAdvanced(PromptStep::Comment)
    );

    h.session
        .log_user_comment("sync loses my drafts".to_string())
        .await
        .unwrap();
    assert_eq!(
        recv(&mut h.signals).await,
        SessionSignal::StepAdvanced(PromptStep::ThankYou)
    );

    let comment = &h.transport.bodies(EventType::SendFeedbackComment)[0];
    assert_eq!(comment["feedbackId"], "fb-1");

    h.session
        .dismiss_prompt(FinalUiState::ThankYou)
        .await
        .unwrap();
    recv(&mut h.dismissals).await;
    assert_eq!(done.await.unwrap(), PromptResult::Completed);
}

#[tokio::test(start_paused = true)]
async fn dismissal_after_a_rating_upgrades_the_logged_event() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1", "isPositiveRating": false
    })))
    .await;

    let done = drive_to_shown(&mut h).await;

    h.session.log_user_feedback(1, None).await.unwrap();
    assert_eq!(
        recv(&mut h.signals).await,
        SessionSignal::StepAdvanced(PromptStep::Comment)
    );

    // The user bails out mid comment step.
    h.session
        .dismiss_prompt(FinalUiState::Comment)
        .await
        .unwrap();
    recv(&mut h.dismissals).await;
    assert_eq!(done.await.unwrap(), PromptResult::CompletedWithoutComment);

    await_ack(&mut h, EventType::SendPromptEvent).await;
    let statuses: Vec<String> = h
        .transport
        .bodies(EventType::SendPromptEvent)
        .iter()
        .map(|b| b["status"].as_str().unwrap().to_string())
        .collect();
    assert!(statuses.contains(&"promptDismissedAfterRating".to_string()));
    assert!(!statuses.contains(&"promptDismissed".to_string()));
}

#[tokio::test(start_paused = true)]
async fn plain_dismissal_log_upgrades_itself_after_feedback() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1", "isPositiveRating": true
    })))
    .await;

    drive_to_shown(&mut h).await;

    h.session.log_user_feedback(4, None).await.unwrap();
    recv(&mut h.signals).await;

    // The caller asks for the plain variant; the session knows better.
    h.session.log_prompt_dismissed().await.unwrap();
    await_ack(&mut h, EventType::SendPromptEvent).await;

    let last = h
        .transport
        .bodies(EventType::SendPromptEvent)
        .last()
        .cloned()
        .unwrap();
    assert_eq!(last["status"], "promptDismissedAfterRating");
}

#[tokio::test(start_paused = true)]
async fn manual_store_review_can_be_skipped() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1",
        "isPositiveRating": true,
        "redirectAutomatically": false,
        "appStoreId": "12345"
    })))
    .await;

    let done = drive_to_shown(&mut h).await;

    h.session.log_user_feedback(5, None).await.unwrap();
    assert_eq!(
        recv(&mut h.signals).await,
        SessionSignal::StepAdvanced(PromptStep::StoreReview)
    );

    h.session
        .dismiss_prompt(FinalUiState::StoreReview { redirected: false })
        .await
        .unwrap();
    recv(&mut h.dismissals).await;
    assert_eq!(done.await.unwrap(), PromptResult::StoreReviewSkipped);

    await_ack(&mut h, EventType::SendPromptEvent).await;
    let statuses: Vec<String> = h
        .transport
        .bodies(EventType::SendPromptEvent)
        .iter()
        .map(|b| b["status"].as_str().unwrap().to_string())
        .collect();
    assert!(statuses.contains(&"storeReviewSkipped".to_string()));
}

#[tokio::test(start_paused = true)]
async fn flow_can_restart_after_settling() {
    let mut h = harness(flow_script(json!({
        "id": "fb-1", "isPositiveRating": true
    })))
    .await;

    let done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();
    recv(&mut h.shows).await;
    h.session
        .dismiss_prompt(FinalUiState::Rating)
        .await
        .unwrap();
    recv(&mut h.dismissals).await;
    assert_eq!(done.await.unwrap(), PromptResult::Cancelled);

    // Idle again: a fresh flow is accepted. This view closes itself, so it
    // settles through the dismiss action alone.
    let done = h
        .session
        .prompt_for_review(metadata(), config())
        .await
        .unwrap();
    recv(&mut h.shows).await;
    h.session
        .handle_dismiss_action(FinalUiState::Rating)
        .await
        .unwrap();
    assert_eq!(done.await.unwrap(), PromptResult::Cancelled);
    assert!(h.dismissals.try_recv().is_err());
}
