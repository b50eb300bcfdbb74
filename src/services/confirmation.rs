use async_trait::async_trait;

use crate::domain::message::CommitMessage;
use crate::error::AppResult;

#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Show `message` and ask whether to commit it. Missing input means no.
    async fn confirm(&self, message: &CommitMessage) -> AppResult<bool>;
}
