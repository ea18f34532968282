//! Per-request call context carrying cancellation, deadline and request id.
//!
//! Every long-running operation takes a [`CallContext`]. Fan-outs derive child
//! contexts so a failing worker can cancel its siblings without cancelling the
//! caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an operation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
    /// The request deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation scope, deadline and correlation id for one request.
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: Arc<str>,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new("-")
    }
}

impl CallContext {
    /// Create a root context without a deadline.
    #[must_use]
    pub fn new(request_id: impl Into<Arc<str>>) -> Self {
        Self {
            request_id: request_id.into(),
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Set an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context whose cancellation does not propagate upwards.
    ///
    /// Cancelling the parent still cancels the child.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            request_id: Arc::clone(&self.request_id),
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Correlation id used in log lines.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check for cancellation or an expired deadline.
    ///
    /// # Errors
    ///
    /// Returns the reason the context is no longer live.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Whether [`CallContext::check`] would fail.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.check().is_err()
    }

    /// Drive `future` unless the context is cancelled or its deadline passes
    /// first; the future is dropped in that case.
    ///
    /// # Errors
    ///
    /// Returns the reason the future was abandoned.
    pub async fn guard<F>(&self, future: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;
        let deadline = self.deadline;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Interrupted::Cancelled),
            () = sleep_until_deadline(deadline) => Err(Interrupted::DeadlineExceeded),
            output = future => Ok(output),
        }
    }

    /// Sleep for `duration`, waking early on cancellation or deadline.
    ///
    /// # Errors
    ///
    /// Returns the reason the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.guard(tokio::time::sleep(duration)).await
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_interruption() {
        let ctx = CallContext::new("req-1");
        assert_eq!(ctx.sleep(Duration::from_millis(200)).await, Ok(()));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn sleep_wakes_on_cancellation() {
        let ctx = CallContext::new("req-1");
        let canceller = ctx.clone();
        let handle = tokio::spawn(async move { ctx.sleep(Duration::from_secs(3600)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
        let outcome = handle.await.expect("sleep task joins");
        assert_eq!(outcome, Err(Interrupted::Cancelled));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn guard_stops_at_deadline() {
        let ctx = CallContext::new("req-1").with_timeout(Duration::from_millis(50));
        let outcome = ctx.sleep(Duration::from_secs(10)).await;
        assert_eq!(outcome, Err(Interrupted::DeadlineExceeded));
        assert!(ctx.is_interrupted());
    }

    #[rstest]
    fn child_cancellation_does_not_reach_parent() {
        let parent = CallContext::new("req-1");
        let child = parent.child();
        child.cancel();
        assert_eq!(child.check(), Err(Interrupted::Cancelled));
        assert_eq!(parent.check(), Ok(()));
    }

    #[rstest]
    fn parent_cancellation_reaches_child() {
        let parent = CallContext::new("req-1");
        let child = parent.child();
        parent.cancel();
        assert_eq!(child.check(), Err(Interrupted::Cancelled));
        assert_eq!(child.request_id(), "req-1");
    }
}
