//! Demo driver: wires a scripted transport and a console presenter, then
//! runs one prompt flow end to end. The first eligibility attempt fails on
//! purpose so the queue's retry path is visible in the logs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use relay_core::RelayError;
use relay_core::domain::{
    EventType, FinalUiState, PromptConfig, PromptStep, QueueFailure, QueuedRequest,
};
use relay_core::ports::{Presenter, Transport};
use relay_core::queue::{MemoryQueueStore, RequestQueue, RetryPolicy};
use relay_core::session::{SessionController, SessionSignal};

/// Fake backend: answers by event type, with a configurable number of
/// intentional failures on the eligibility check.
struct DemoTransport {
    remaining_failures: AtomicU32,
}

impl DemoTransport {
    fn new(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl Transport for DemoTransport {
    async fn execute(&self, request: &QueuedRequest) -> Result<Vec<u8>, QueueFailure> {
        let body = match request.event_type() {
            EventType::CheckPromptEligibility => {
                let left = self.remaining_failures.load(Ordering::Relaxed);
                if left > 0 {
                    self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
                    return Err(QueueFailure::http(
                        503,
                        format!("https://api.example.com{}", request.path()),
                        &format!("intentional failure (left={left})"),
                    ));
                }
                json!({ "id": "elig-1", "eligible": true })
            }
            EventType::SendPromptEvent => {
                let sent: serde_json::Value =
                    serde_json::from_slice(request.body().unwrap_or(b"{}"))
                        .unwrap_or_else(|_| json!({}));
                json!({ "id": "pe-1", "status": sent["status"] })
            }
            EventType::SendFeedbackEvent | EventType::SendFeedbackComment => json!({
                "id": "fb-1",
                "isPositiveRating": true,
                "requestComment": false,
                "redirectAutomatically": false,
                "appStoreId": "12345",
            }),
        };
        Ok(body.to_string().into_bytes())
    }
}

/// Prints what a real view layer would render, and reports back over a
/// channel so `main` can drive the flow like a user would.
struct ConsolePresenter {
    shown: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl Presenter for ConsolePresenter {
    async fn show(&self, config: &PromptConfig) {
        println!(
            "[ui] prompt on screen: {}",
            config.title.as_deref().unwrap_or("(untitled)")
        );
        let _ = self.shown.send(());
    }

    async fn dismiss(&self) {
        println!("[ui] prompt closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_core=debug".into()),
        )
        .init();

    let queue = RequestQueue::spawn(
        Arc::new(DemoTransport::new(1)),
        Arc::new(MemoryQueueStore::new()),
        RetryPolicy::default(),
    );
    queue.configure().await?;

    let (shown_tx, mut shown_rx) = mpsc::unbounded_channel();
    let session =
        SessionController::spawn(queue.clone(), Arc::new(ConsolePresenter { shown: shown_tx }))
            .await?;
    let mut signals = session.observe().await?;

    let metadata = BTreeMap::from([("appVersion".to_string(), "3.2.0".to_string())]);
    let config = PromptConfig {
        title: Some("Enjoying the app?".to_string()),
        message: Some("Tell us how it's going.".to_string()),
    };

    let done = session.prompt_for_review(metadata, config).await?;
    println!("[app] eligibility check queued (first attempt will fail)");

    // The presenter reports the prompt on screen; the "user" rates 5 stars.
    shown_rx.recv().await;
    session.log_prompt_shown().await?;
    session.log_user_feedback(5, None).await?;

    match signals.recv().await {
        Some(SessionSignal::StepAdvanced(PromptStep::StoreReview)) => {
            println!("[app] store review offered; user skips it");
            session
                .dismiss_prompt(FinalUiState::StoreReview { redirected: false })
                .await?;
        }
        Some(signal) => println!("[app] unexpected signal: {signal:?}"),
        None => println!("[app] session ended early"),
    }

    match done.await {
        Ok(result) => println!("[app] prompt result: {result:?}"),
        Err(_) => println!("[app] session dropped before settling"),
    }

    // Give the final dismissal event a moment to reach the fake backend.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    Ok(())
}
