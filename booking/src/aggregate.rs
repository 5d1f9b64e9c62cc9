//! Caller-level ticket aggregation under a time budget.

use airfare_core::environment::Scheduler;
use futures::{Stream, StreamExt};
use std::pin::pin;
use std::time::Duration;

/// Default wait before the collected tickets are reported
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(10);

/// Items gathered by [`collect_within`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    /// Items in arrival order
    pub items: Vec<T>,
    /// Whether the budget ran out before the stream ended
    pub budget_elapsed: bool,
}

/// Consume `stream` until it ends or `budget` elapses, whichever is first
///
/// The stream is dropped on return. For a
/// [`BookingStream`](crate::service::BookingStream) that cancels every
/// pipeline still running.
pub async fn collect_within<S>(stream: S, scheduler: &dyn Scheduler, budget: Duration) -> Collected<S::Item>
where
    S: Stream,
{
    let mut stream = pin!(stream.take_until(scheduler.sleep(budget)));

    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item);
    }

    let budget_elapsed = stream.is_stopped();
    if budget_elapsed {
        tracing::debug!(collected = items.len(), ?budget, "Budget elapsed, dropping the rest");
    }

    Collected {
        items,
        budget_elapsed,
    }
}
