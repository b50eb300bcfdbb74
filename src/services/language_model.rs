use async_trait::async_trait;

use crate::domain::diff::PreparedDiff;
use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn summarize_diff(&self, diff: &PreparedDiff) -> AppResult<String>;
}
