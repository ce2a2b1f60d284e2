//! Presentation port: the layer that actually renders the prompt UI.

use async_trait::async_trait;

use crate::domain::PromptConfig;

/// Renders and closes the prompt on behalf of the session.
///
/// The view layer eventually answers `show` by calling
/// `SessionController::dismiss_prompt` with the final on-screen state.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn show(&self, config: &PromptConfig);

    async fn dismiss(&self);
}
