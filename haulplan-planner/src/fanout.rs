//! Bounded concurrent fan-out with first-failure cancellation.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use haulplan_core::{CallContext, Interrupted};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const NO_FAILURE: usize = usize::MAX;

/// Run `work` once per item with at most `limit` calls in flight.
///
/// Every task receives a child of `ctx`. The first task to fail cancels that
/// child, so queued tasks give up before starting and running tasks see the
/// cancellation at their next check. All tasks are drained before the
/// outcome is decided.
///
/// Outputs are returned in input order. On failure the error of the task that
/// failed first, in completion order, is returned and no outputs are.
///
/// # Errors
///
/// Returns the first task error, or `E::from(Interrupted)` when `ctx` is
/// cancelled or past its deadline.
///
/// # Panics
///
/// A panic inside a task is re-raised on the caller once every other task
/// has finished.
pub async fn run_bounded<I, T, E, F, Fut>(
    items: Vec<I>,
    limit: usize,
    ctx: &CallContext,
    work: F,
) -> Result<Vec<T>, E>
where
    T: Send + 'static,
    E: From<Interrupted> + Send + 'static,
    F: Fn(I, CallContext) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    ctx.check()?;
    let child = ctx.child();
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let first_failure = Arc::new(AtomicUsize::new(NO_FAILURE));
    let mut tasks = JoinSet::new();

    let count = items.len();
    for (index, item) in items.into_iter().enumerate() {
        let task_ctx = child.clone();
        let permits = Arc::clone(&permits);
        let first_failure = Arc::clone(&first_failure);
        let future = work(item, child.clone());
        tasks.spawn(async move {
            let outcome = admit(&permits, &task_ctx, future).await;
            if outcome.is_err()
                && first_failure
                    .compare_exchange(NO_FAILURE, index, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
            {
                task_ctx.cancel();
            }
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<Result<T, E>>> = (0..count).map(|_| None).collect();
    let mut panic: Option<Box<dyn Any + Send>> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(outcome);
                }
            }
            Err(err) if err.is_panic() => {
                child.cancel();
                panic.get_or_insert(err.into_panic());
            }
            Err(_) => child.cancel(),
        }
    }
    if let Some(payload) = panic {
        std::panic::resume_unwind(payload);
    }

    let failed = first_failure.load(Ordering::SeqCst);
    if failed != NO_FAILURE
        && let Some(Some(Err(err))) = slots.get_mut(failed).map(Option::take)
    {
        return Err(err);
    }
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(Interrupted::Cancelled.into())))
        .collect()
}

async fn admit<T, E, Fut>(permits: &Semaphore, ctx: &CallContext, future: Fut) -> Result<T, E>
where
    E: From<Interrupted>,
    Fut: Future<Output = Result<T, E>>,
{
    let _permit = ctx
        .guard(permits.acquire())
        .await?
        .map_err(|_| Interrupted::Cancelled)?;
    ctx.check()?;
    future.await
}
