//! Session actor: the sole owner of one feedback-prompt session's state.
//!
//! Two inputs feed one serialized loop: the command channel (public
//! operations) and the queue's result stream. Only terminal results are
//! applied; attempts flagged for retry are skipped because the final word
//! for that request is still to come.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::codec;
use crate::domain::{
    EligibilityResponse, EventType, FeedbackResponse, FinalUiState, PromptConfig,
    PromptEventResponse, PromptEventStatus, PromptResult, PromptState, PromptStep, QueuedRequest,
    QueuedRequestResult, RequestId, RequestOutcome, next_step,
};
use crate::error::RelayError;
use crate::fanout::Fanout;
use crate::ports::Presenter;
use crate::queue::RequestQueue;

use super::SessionSignal;
use super::command::SessionCommand;
use super::requests;

pub(super) struct SessionActor {
    state: PromptState,
    eligibility: Option<EligibilityResponse>,
    prompt_event: Option<PromptEventResponse>,
    feedback: Option<FeedbackResponse>,
    feedback_registered: bool,
    metadata: BTreeMap<String, String>,
    config: PromptConfig,
    completions: HashMap<RequestId, oneshot::Sender<PromptResult>>,
    signals: Fanout<SessionSignal>,
    queue: RequestQueue,
    presenter: Arc<dyn Presenter>,
    command_rx: mpsc::Receiver<SessionCommand>,
    results: mpsc::UnboundedReceiver<QueuedRequestResult>,
}

impl SessionActor {
    pub(super) fn new(
        queue: RequestQueue,
        presenter: Arc<dyn Presenter>,
        command_rx: mpsc::Receiver<SessionCommand>,
        results: mpsc::UnboundedReceiver<QueuedRequestResult>,
    ) -> Self {
        Self {
            state: PromptState::Idle,
            eligibility: None,
            prompt_event: None,
            feedback: None,
            feedback_registered: false,
            metadata: BTreeMap::new(),
            config: PromptConfig::default(),
            completions: HashMap::new(),
            signals: Fanout::new(),
            queue,
            presenter,
            command_rx,
            results,
        }
    }

    pub(super) async fn run(mut self) {
        debug!("session actor started");
        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                result = self.results.recv() => {
                    match result {
                        Some(result) if result.is_terminal() => {
                            self.handle_result(result).await;
                        }
                        // A flagged retry attempt; the terminal word follows.
                        Some(_) => {}
                        None => break,
                    }
                }
            }
        }
        debug!("session actor stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::PromptForReview {
                metadata,
                config,
                reply,
            } => {
                let _ = reply.send(self.start_flow(metadata, config).await);
            }
            SessionCommand::LogPromptShown => self.log_prompt_shown().await,
            SessionCommand::LogPromptDismissed => {
                // A registered rating upgrades the plain dismissal so the
                // backend never records the wrong event.
                if self.feedback_registered {
                    self.log_prompt_event(PromptEventStatus::PromptDismissedAfterRating)
                        .await;
                } else {
                    self.log_prompt_event(PromptEventStatus::PromptDismissed).await;
                }
            }
            SessionCommand::LogPromptDismissedAfterRating => {
                self.log_prompt_event(PromptEventStatus::PromptDismissedAfterRating)
                    .await;
            }
            SessionCommand::LogRedirectedToStore => {
                self.log_prompt_event(PromptEventStatus::RedirectedToStore).await;
            }
            SessionCommand::LogStoreReviewSkipped => {
                self.log_prompt_event(PromptEventStatus::StoreReviewSkipped).await;
            }
            SessionCommand::LogUserFeedback { rating, comment } => {
                self.log_user_feedback(rating, comment).await;
            }
            SessionCommand::LogUserComment { comment } => {
                self.log_user_comment(comment).await;
            }
            SessionCommand::DismissPrompt { final_state } => {
                self.dismiss_prompt(final_state).await;
            }
            SessionCommand::HandleDismissAction { final_state } => {
                self.handle_dismiss_action(final_state).await;
            }
            SessionCommand::Observe { reply } => {
                let _ = reply.send(self.signals.subscribe());
            }
            SessionCommand::State { reply } => {
                let _ = reply.send(self.state);
            }
        }
    }

    async fn start_flow(
        &mut self,
        metadata: BTreeMap<String, String>,
        config: PromptConfig,
    ) -> Result<oneshot::Receiver<PromptResult>, RelayError> {
        if !self.state.is_idle() {
            warn!(state = %self.state, "prompt requested while a flow is active; rejecting");
            return Err(RelayError::PromptInProgress(self.state));
        }
        self.metadata = metadata;
        self.config = config;
        self.state = PromptState::CheckingEligibility;

        let request = requests::check_eligibility(&self.metadata);
        let (tx, rx) = oneshot::channel();
        self.completions.insert(request.id(), tx);
        self.enqueue(request).await;
        Ok(rx)
    }

    async fn enqueue(&mut self, request: QueuedRequest) {
        if let Err(error) = self.queue.enqueue(request).await {
            warn!(%error, "enqueue failed");
        }
    }

    async fn log_prompt_shown(&mut self) {
        let Some(eligibility_id) = self.eligibility.as_ref().map(|e| e.id.clone()) else {
            warn!("prompt-shown log without an eligibility response; dropping");
            return;
        };
        self.state = PromptState::Shown;
        let request = requests::prompt_event(
            PromptEventStatus::PromptShown,
            &eligibility_id,
            &self.metadata,
        );
        self.enqueue(request).await;
    }

    /// Log a prompt lifecycle event against the most recent event id: the
    /// current prompt event if one was acknowledged, else the eligibility.
    async fn log_prompt_event(&mut self, status: PromptEventStatus) {
        let parent = self
            .prompt_event
            .as_ref()
            .map(|p| p.id.clone())
            .or_else(|| self.eligibility.as_ref().map(|e| e.id.clone()));
        let Some(parent_id) = parent else {
            warn!(%status, "prompt event without a parent id; dropping");
            return;
        };
        let request = requests::prompt_event(status, &parent_id, &self.metadata);
        self.enqueue(request).await;
    }

    async fn log_user_feedback(&mut self, rating: u8, comment: Option<String>) {
        // Reference the prompt event when its ack has landed; on a slow
        // network the rating can beat the ack, so fall back to the
        // eligibility the prompt was shown under.
        let parent = self
            .prompt_event
            .as_ref()
            .map(|p| p.id.clone())
            .or_else(|| self.eligibility.as_ref().map(|e| e.id.clone()));
        let Some(prompt_event_id) = parent else {
            warn!("user feedback without an active prompt; dropping");
            return;
        };
        self.feedback_registered = true;
        let request = requests::user_feedback(
            &prompt_event_id,
            rating,
            comment.as_deref(),
            &self.metadata,
        );
        self.enqueue(request).await;
    }

    async fn log_user_comment(&mut self, comment: String) {
        let Some(feedback_id) = self.feedback.as_ref().map(|f| f.id.clone()) else {
            warn!("comment update without a feedback response; dropping");
            return;
        };
        let request = requests::user_comment(&feedback_id, &comment);
        self.enqueue(request).await;
    }

    async fn dismiss_prompt(&mut self, final_state: FinalUiState) {
        self.state = PromptState::Dismissing;
        self.presenter.dismiss().await;
        self.handle_dismiss_action(final_state).await;
    }

    /// Map the final on-screen state to its log event and terminal result,
    /// then settle the flow.
    async fn handle_dismiss_action(&mut self, final_state: FinalUiState) {
        let result = match final_state {
            FinalUiState::Rating => {
                self.log_prompt_event(PromptEventStatus::PromptDismissed).await;
                PromptResult::Cancelled
            }
            FinalUiState::Comment => {
                self.log_prompt_event(PromptEventStatus::PromptDismissedAfterRating)
                    .await;
                PromptResult::CompletedWithoutComment
            }
            FinalUiState::ThankYou => {
                if self.feedback_registered {
                    self.log_prompt_event(PromptEventStatus::PromptDismissedAfterRating)
                        .await;
                } else {
                    self.log_prompt_event(PromptEventStatus::PromptDismissed).await;
                }
                if self.feedback.is_some() {
                    PromptResult::Completed
                } else {
                    PromptResult::Cancelled
                }
            }
            FinalUiState::StoreReview { redirected: true } => {
                self.log_prompt_event(PromptEventStatus::RedirectedToStore).await;
                PromptResult::RedirectedToStore
            }
            FinalUiState::StoreReview { redirected: false } => {
                self.log_prompt_event(PromptEventStatus::StoreReviewSkipped).await;
                PromptResult::StoreReviewSkipped
            }
        };
        self.settle(result);
    }

    /// Fire every pending completion exactly once and reset to idle.
    fn settle(&mut self, result: PromptResult) {
        debug!(?result, "session settled");
        for (_, tx) in self.completions.drain() {
            let _ = tx.send(result);
        }
        self.eligibility = None;
        self.prompt_event = None;
        self.feedback = None;
        self.feedback_registered = false;
        self.metadata.clear();
        self.config = PromptConfig::default();
        self.state = PromptState::Idle;
    }

    async fn handle_result(&mut self, result: QueuedRequestResult) {
        match result.outcome {
            RequestOutcome::Success(bytes) => {
                self.apply_success(result.event_type, bytes).await;
            }
            RequestOutcome::Failure(failure) => {
                self.apply_failure(result.event_type, failure.to_string());
            }
        }
    }

    async fn apply_success(&mut self, event_type: EventType, bytes: Vec<u8>) {
        match event_type {
            EventType::CheckPromptEligibility => {
                match codec::decode::<EligibilityResponse>(event_type, &bytes) {
                    Ok(response) if response.eligible => {
                        debug!(id = %response.id, "eligible; requesting prompt UI");
                        self.feedback = None;
                        self.feedback_registered = false;
                        self.eligibility = Some(response);
                        self.state = PromptState::Eligible;
                        self.presenter.show(&self.config).await;
                        self.state = PromptState::Showing;
                    }
                    Ok(_) => {
                        // Denied eligibility is silent: the prompt just never
                        // appears, and the caller hears `Cancelled`.
                        debug!("not eligible; settling quietly");
                        self.settle(PromptResult::Cancelled);
                    }
                    Err(error) => self.apply_failure(event_type, error.to_string()),
                }
            }
            EventType::SendPromptEvent => {
                match codec::decode::<PromptEventResponse>(event_type, &bytes) {
                    Ok(response) => {
                        let dismissal = response.status.is_dismissal();
                        self.prompt_event = Some(response);
                        if dismissal {
                            self.eligibility = None;
                            self.prompt_event = None;
                            self.metadata.clear();
                        }
                    }
                    Err(error) => self.apply_failure(event_type, error.to_string()),
                }
            }
            EventType::SendFeedbackEvent => {
                match codec::decode::<FeedbackResponse>(event_type, &bytes) {
                    Ok(response) => {
                        let step = next_step(&response);
                        debug!(id = %response.id, ?step, "feedback recorded");
                        self.feedback = Some(response);
                        self.signals.send(&SessionSignal::StepAdvanced(step));
                    }
                    Err(error) => self.apply_failure(event_type, error.to_string()),
                }
            }
            EventType::SendFeedbackComment => {
                match codec::decode::<FeedbackResponse>(event_type, &bytes) {
                    Ok(response) => {
                        self.feedback = Some(response);
                        self.signals
                            .send(&SessionSignal::StepAdvanced(PromptStep::ThankYou));
                    }
                    Err(error) => self.apply_failure(event_type, error.to_string()),
                }
            }
        }
    }

    /// Failures never crash the flow; they fall back toward idle or a safe
    /// UI state and tell the observers what happened.
    fn apply_failure(&mut self, event_type: EventType, message: String) {
        warn!(%event_type, "event failed: {message}");
        match event_type {
            EventType::CheckPromptEligibility => {
                self.signals.send(&SessionSignal::Error {
                    event_type,
                    message,
                });
                self.settle(PromptResult::Cancelled);
            }
            EventType::SendPromptEvent => {
                self.eligibility = None;
                self.prompt_event = None;
                self.metadata.clear();
                self.signals.send(&SessionSignal::Error {
                    event_type,
                    message,
                });
            }
            EventType::SendFeedbackEvent | EventType::SendFeedbackComment => {
                self.signals.send(&SessionSignal::Error {
                    event_type,
                    message,
                });
            }
        }
    }
}
