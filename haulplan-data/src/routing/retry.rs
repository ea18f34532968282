//! Retry schedule for routing requests.

use std::future::Future;
use std::time::Duration;

use haulplan_core::{CallContext, LookupError, UpstreamError};
use reqwest::StatusCode;

const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Bounded exponential backoff for transient upstream failures.
///
/// Attempt `n` that fails transiently is followed by a wait of
/// `initial_backoff * 2^(n-1)` unless it was the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below one act as one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Build a policy with explicit limits.
    #[must_use]
    pub const fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Wait before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Whether an HTTP status is worth another attempt.
    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    /// Run `attempt_fn` until it succeeds, fails permanently or the attempts
    /// run out.
    ///
    /// Each attempt and each backoff wait races the context, so cancellation
    /// or an expired deadline abandons the call promptly.
    ///
    /// # Errors
    ///
    /// - [`LookupError::Interrupted`] when the context fires first.
    /// - [`LookupError::Upstream`] with the permanent error, or with
    ///   [`UpstreamError::Exhausted`] once every attempt failed transiently.
    pub async fn run<T, F, Fut>(
        &self,
        ctx: &CallContext,
        url: &str,
        mut attempt_fn: F,
    ) -> Result<T, LookupError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match ctx.guard(attempt_fn(attempt)).await? {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if !error.is_retryable() {
                return Err(error.into());
            }
            if attempt >= max_attempts {
                return Err(UpstreamError::Exhausted {
                    url: url.to_owned(),
                    attempts: attempt,
                    last: last_message(error),
                }
                .into());
            }
            let delay = self.backoff_after(attempt);
            log::warn!(
                "request_id={} attempt {attempt}/{max_attempts} to {url} failed: {error}; retrying in {delay:?}",
                ctx.request_id()
            );
            ctx.sleep(delay).await?;
            attempt += 1;
        }
    }
}

fn last_message(error: UpstreamError) -> String {
    match error {
        UpstreamError::Transient { message, .. } => message,
        other => other.to_string(),
    }
}
