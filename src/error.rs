use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("git is not available: {0}")]
    VcsUnavailable(String),
    #[error("not inside a git repository; run commitgen from within a work tree")]
    NotARepository,
    #[error("version control error: {0}")]
    VersionControl(String),
    #[error("API key not found; set {var} in the environment or a .env file")]
    CredentialMissing { var: &'static str },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("the language model returned an empty commit message")]
    EmptyResponse,
    #[error(
        "staged diff is {chars} characters, over the {limit} character limit; \
         raise --max-diff-chars or use --oversized-diff truncate"
    )]
    DiffTooLarge { chars: usize, limit: usize },
    #[error("git commit failed:\n{0}")]
    CommitFailed(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("interrupted")]
    Interrupted,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Process exit code for this failure category.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Configuration(_)
            | AppError::VersionControl(_)
            | AppError::Clipboard(_)
            | AppError::Io(_) => 1,
            AppError::VcsUnavailable(_) | AppError::NotARepository => 4,
            AppError::CredentialMissing { .. } => 5,
            AppError::Upstream(err) if err.is_retryable() => 6,
            AppError::Upstream(_) => 7,
            AppError::EmptyResponse => 8,
            AppError::DiffTooLarge { .. } => 9,
            AppError::CommitFailed(_) => 10,
            AppError::Interrupted => 130,
        }
    }
}

/// Failures talking to the text-generation service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("rate limited by the language model service (HTTP 429): {body}")]
    RateLimited {
        retry_after: Option<Duration>,
        body: String,
    },
    #[error("language model service rejected the API key (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },
    #[error("language model service responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to reach the language model service: {0}")]
    Transport(String),
    #[error("language model service returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("language model request timed out after {0} seconds")]
    Timeout(u64),
    #[error("giving up after repeated rate limiting: {0}")]
    RetriesExhausted(#[source] Box<UpstreamError>),
}

impl UpstreamError {
    /// Rate limiting is the only condition worth waiting out.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::RateLimited { .. } => true,
            UpstreamError::RetriesExhausted(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
