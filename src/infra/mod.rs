pub mod clipboard;
pub mod git;
pub mod llm;
pub mod retry;
pub mod terminal;
