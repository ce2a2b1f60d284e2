//! Session state machine: drives one feedback-prompt flow to conclusion,
//! exactly once.
//!
//! The controller is a cheap-to-clone handle; all session state lives in the
//! actor and is mutated only there. The external view layer interacts
//! through the documented operations and the `observe` stream, never by
//! reaching into session internals.

mod actor;
mod command;
mod requests;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{EventType, FinalUiState, PromptConfig, PromptResult, PromptState, PromptStep};
use crate::error::RelayError;
use crate::ports::Presenter;
use crate::queue::RequestQueue;

use actor::SessionActor;
use command::SessionCommand;

const CHANNEL_CAPACITY: usize = 64;

/// Observable projection of session progress for the view-model adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// The flow advanced; the view should present this step next.
    StepAdvanced(PromptStep),
    /// A session event failed terminally; the view may fall back.
    Error {
        event_type: EventType,
        message: String,
    },
}

/// Handle to one session actor.
#[derive(Clone)]
pub struct SessionController {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionController {
    /// Spawn the session actor. The queue subscription is taken before this
    /// returns, so no result broadcast can be missed.
    pub async fn spawn(
        queue: RequestQueue,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self, RelayError> {
        let results = queue.subscribe().await?;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let actor = SessionActor::new(queue, presenter, rx, results);
        tokio::spawn(actor.run());
        Ok(Self { tx })
    }

    /// Begin a prompt flow if the session is idle; rejected (with a warning
    /// log) otherwise.
    ///
    /// The returned channel resolves exactly once, with the terminal
    /// [`PromptResult`] of the flow.
    pub async fn prompt_for_review(
        &self,
        metadata: BTreeMap<String, String>,
        config: PromptConfig,
    ) -> Result<oneshot::Receiver<PromptResult>, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::PromptForReview {
                metadata,
                config,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::SessionClosed)?;
        reply_rx.await.map_err(|_| RelayError::SessionClosed)?
    }

    /// The view confirmed the prompt is on screen.
    pub async fn log_prompt_shown(&self) -> Result<(), RelayError> {
        self.send(SessionCommand::LogPromptShown).await
    }

    /// The prompt closed without a rating. Upgrades itself to the
    /// after-rating variant when feedback was already registered this
    /// session.
    pub async fn log_prompt_dismissed(&self) -> Result<(), RelayError> {
        self.send(SessionCommand::LogPromptDismissed).await
    }

    pub async fn log_prompt_dismissed_after_rating(&self) -> Result<(), RelayError> {
        self.send(SessionCommand::LogPromptDismissedAfterRating).await
    }

    pub async fn log_redirected_to_store(&self) -> Result<(), RelayError> {
        self.send(SessionCommand::LogRedirectedToStore).await
    }

    pub async fn log_store_review_skipped(&self) -> Result<(), RelayError> {
        self.send(SessionCommand::LogStoreReviewSkipped).await
    }

    /// Submit the user's rating (and optional comment) against the current
    /// prompt event.
    pub async fn log_user_feedback(
        &self,
        rating: u8,
        comment: Option<String>,
    ) -> Result<(), RelayError> {
        self.send(SessionCommand::LogUserFeedback { rating, comment })
            .await
    }

    /// Attach a comment to the feedback recorded earlier in this session.
    pub async fn log_user_comment(&self, comment: String) -> Result<(), RelayError> {
        self.send(SessionCommand::LogUserComment { comment }).await
    }

    /// Close the prompt and settle the flow from the final on-screen state.
    pub async fn dismiss_prompt(&self, final_state: FinalUiState) -> Result<(), RelayError> {
        self.send(SessionCommand::DismissPrompt { final_state }).await
    }

    /// Settle the flow from the final on-screen state without asking the
    /// presenter to close (for views that already closed themselves).
    pub async fn handle_dismiss_action(&self, final_state: FinalUiState) -> Result<(), RelayError> {
        self.send(SessionCommand::HandleDismissAction { final_state })
            .await
    }

    /// Stream of [`SessionSignal`]s from this moment on.
    pub async fn observe(&self) -> Result<mpsc::UnboundedReceiver<SessionSignal>, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Observe { reply: reply_tx })
            .await
            .map_err(|_| RelayError::SessionClosed)?;
        reply_rx.await.map_err(|_| RelayError::SessionClosed)
    }

    /// Current state, for diagnostics and tests.
    pub async fn state(&self) -> Result<PromptState, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::State { reply: reply_tx })
            .await
            .map_err(|_| RelayError::SessionClosed)?;
        reply_rx.await.map_err(|_| RelayError::SessionClosed)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), RelayError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| RelayError::SessionClosed)
    }
}
