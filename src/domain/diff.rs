use std::fmt;

use crate::error::{AppError, AppResult};

/// Paths left out of the staged diff unless overridden.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] =
    &["package-lock.json", "pnpm-lock.yaml", "yarn.lock", "*.svg"];

pub const DEFAULT_MAX_DIFF_CHARS: usize = 30_000;

#[derive(Debug, Clone)]
pub struct StagedDiff {
    pub text: String,
}

impl StagedDiff {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What to do with a diff that exceeds the configured size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizedDiffPolicy {
    Truncate,
    Reject,
}

impl OversizedDiffPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversizedDiffPolicy::Truncate => "truncate",
            OversizedDiffPolicy::Reject => "reject",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "truncate" => Some(OversizedDiffPolicy::Truncate),
            "reject" => Some(OversizedDiffPolicy::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for OversizedDiffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The diff text that will actually be submitted for generation.
#[derive(Debug, Clone)]
pub struct PreparedDiff {
    pub text: String,
    pub original_chars: usize,
    pub truncated: bool,
}

impl PreparedDiff {
    /// Apply the size limit. Truncation keeps a visible marker in the text.
    pub fn from_staged(
        diff: &StagedDiff,
        limit: usize,
        policy: OversizedDiffPolicy,
    ) -> AppResult<Self> {
        let original_chars = diff.text.chars().count();
        if original_chars <= limit {
            return Ok(Self {
                text: diff.text.clone(),
                original_chars,
                truncated: false,
            });
        }

        match policy {
            OversizedDiffPolicy::Reject => Err(AppError::DiffTooLarge {
                chars: original_chars,
                limit,
            }),
            OversizedDiffPolicy::Truncate => {
                let cut = diff
                    .text
                    .char_indices()
                    .nth(limit)
                    .map(|(idx, _)| idx)
                    .unwrap_or(diff.text.len());
                let text = format!(
                    "{}\n[diff truncated: {limit} of {original_chars} characters shown]",
                    &diff.text[..cut]
                );
                Ok(Self {
                    text,
                    original_chars,
                    truncated: true,
                })
            }
        }
    }
}
