//! Bounded fixed-backoff retry for rate-limited generation requests.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use tracing::warn;

use crate::error::UpstreamError;

/// Total attempts, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;
const FIXED_INTERVAL: Duration = Duration::from_secs(2);
/// Upper bound on a server-provided `Retry-After`.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Call `attempt` until it succeeds, fails with a non-retryable error, or
/// `MAX_ATTEMPTS` is reached.
///
/// Only rate limiting is retried. The wait between attempts is fixed, unless
/// the server sent a `Retry-After` hint, which is honoured up to a cap.
pub async fn retry_rate_limited<T, Fut, F>(mut attempt: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut backoff = Constant::new(FIXED_INTERVAL);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        if attempts >= MAX_ATTEMPTS {
            return Err(UpstreamError::RetriesExhausted(Box::new(err)));
        }

        let wait = match &err {
            UpstreamError::RateLimited {
                retry_after: Some(hint),
                ..
            } => (*hint).min(MAX_RETRY_AFTER),
            _ => backoff.next_backoff().unwrap_or(FIXED_INTERVAL),
        };
        warn!(
            attempt = attempts,
            max_attempts = MAX_ATTEMPTS,
            wait_secs = wait.as_secs_f32(),
            "rate limited by language model service, retrying"
        );
        tokio::time::sleep(wait).await;
    }
}
