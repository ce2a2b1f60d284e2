//! Command protocol for the session actor.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{FinalUiState, PromptConfig, PromptResult, PromptState};
use crate::error::RelayError;

use super::SessionSignal;

pub(super) enum SessionCommand {
    PromptForReview {
        metadata: BTreeMap<String, String>,
        config: PromptConfig,
        reply: oneshot::Sender<Result<oneshot::Receiver<PromptResult>, RelayError>>,
    },
    LogPromptShown,
    LogPromptDismissed,
    LogPromptDismissedAfterRating,
    LogRedirectedToStore,
    LogStoreReviewSkipped,
    LogUserFeedback {
        rating: u8,
        comment: Option<String>,
    },
    LogUserComment {
        comment: String,
    },
    DismissPrompt {
        final_state: FinalUiState,
    },
    HandleDismissAction {
        final_state: FinalUiState,
    },
    Observe {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<SessionSignal>>,
    },
    State {
        reply: oneshot::Sender<PromptState>,
    },
}
