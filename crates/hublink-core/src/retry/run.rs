//! Retry loop: run an async operation until success or the policy says stop.

use std::fmt;
use std::future::Future;

use super::error::Transient;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the retry policy says to stop.
/// On a retryable failure, sleeps for the backoff duration then tries again.
///
/// The policy is asked with the number of failed attempts so far (1 after
/// the first failure), so the operation runs at most `max_retries` times,
/// and once even when `max_retries` is zero. The last error is returned
/// unchanged.
pub async fn run_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        attempt = attempt.saturating_add(1);
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match policy.should_retry(attempt, &e) {
                RetryDecision::NoRetry => {
                    tracing::debug!(attempt, error = %e, "giving up");
                    return Err(e);
                }
                RetryDecision::RetryAfter(d) => {
                    let delay_ms = d.as_millis() as u64;
                    tracing::warn!(attempt, delay_ms, error = %e, "retrying");
                    tokio::time::sleep(d).await;
                }
            },
        }
    }
}
