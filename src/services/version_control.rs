use async_trait::async_trait;

use crate::domain::diff::StagedDiff;
use crate::domain::message::CommitMessage;
use crate::error::AppResult;

#[async_trait]
pub trait VersionControlService: Send + Sync {
    /// Staged changes, leaving out anything matching `excluded_paths`.
    async fn staged_diff(&self, excluded_paths: &[String]) -> AppResult<StagedDiff>;
    /// Commit exactly what is already staged.
    async fn commit(&self, message: &CommitMessage) -> AppResult<String>;
}
