pub mod clipboard;
pub mod confirmation;
pub mod language_model;
pub mod version_control;

pub use clipboard::ClipboardService;
pub use confirmation::ConfirmationPrompt;
pub use language_model::LanguageModelService;
pub use version_control::VersionControlService;
