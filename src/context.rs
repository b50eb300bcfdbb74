use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    ClipboardService, ConfirmationPrompt, LanguageModelService, VersionControlService,
};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub language_model: Arc<dyn LanguageModelService>,
    /// `None` when clipboard publishing is switched off.
    pub clipboard: Option<Arc<dyn ClipboardService>>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        language_model: Arc<dyn LanguageModelService>,
        clipboard: Option<Arc<dyn ClipboardService>>,
        prompt: Arc<dyn ConfirmationPrompt>,
    ) -> Self {
        Self {
            config,
            version_control,
            language_model,
            clipboard,
            prompt,
        }
    }
}
