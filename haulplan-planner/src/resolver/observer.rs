//! Hooks for failures the resolver tolerates.

use haulplan_core::{CacheError, CallContext};

/// Receives cache write failures, which never fail a resolution.
pub trait ResolverObserver: Send + Sync {
    /// A best-effort cache write failed.
    fn cache_write_failed(&self, ctx: &CallContext, error: &CacheError);
}

/// Logs tolerated failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ResolverObserver for LogObserver {
    fn cache_write_failed(&self, ctx: &CallContext, error: &CacheError) {
        log::warn!(
            "request_id={} cache write skipped: {error}",
            ctx.request_id()
        );
    }
}
