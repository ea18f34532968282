//! Scoped operation timing.
//!
//! [`OperationTimer`] logs how long an operation took and whether it
//! succeeded. A timer dropped without [`OperationTimer::finish`] logs the
//! operation as abandoned, which is what happens when a caller cancels a
//! future mid-flight.

use std::fmt::Display;

use tokio::time::Instant;

use crate::context::CallContext;

/// Times one named operation for the lifetime of the value.
#[derive(Debug)]
pub struct OperationTimer {
    operation: &'static str,
    request_id: String,
    started: Instant,
    finished: bool,
}

impl OperationTimer {
    /// Start timing `operation` on behalf of `ctx`.
    #[must_use]
    pub fn start(operation: &'static str, ctx: &CallContext) -> Self {
        Self {
            operation,
            request_id: ctx.request_id().to_owned(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Name of the operation being timed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// Log the outcome and hand the result back to the caller.
    pub fn finish<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: Display,
    {
        self.finished = true;
        let elapsed_ms = self.started.elapsed().as_millis();
        match &result {
            Ok(_) => log::debug!(
                "op={} request_id={} ok elapsed_ms={elapsed_ms}",
                self.operation,
                self.request_id
            ),
            Err(err) => log::debug!(
                "op={} request_id={} failed elapsed_ms={elapsed_ms}: {err}",
                self.operation,
                self.request_id
            ),
        }
        result
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!(
                "op={} request_id={} abandoned elapsed_ms={}",
                self.operation,
                self.request_id,
                self.started.elapsed().as_millis()
            );
        }
    }
}
