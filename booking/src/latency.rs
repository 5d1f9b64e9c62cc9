//! Simulated access latency.

use crate::random::SharedRng;
use airfare_core::environment::Scheduler;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Random delay bounded by a maximum, waited on through the scheduler
///
/// Each [`delay`](Self::delay) draws a fresh duration in `0..max`
/// (millisecond resolution). The timer only starts once the returned future
/// is first polled.
#[derive(Clone)]
pub struct SimulatedLatency {
    scheduler: Arc<dyn Scheduler>,
    max: Duration,
    rng: SharedRng,
}

impl SimulatedLatency {
    /// Creates a latency source bounded by `max`
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>, max: Duration, rng: SharedRng) -> Self {
        Self { scheduler, max, rng }
    }

    /// Upper bound of the simulated delay (exclusive)
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Draw the next delay
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rng.below(0..max_ms))
    }

    /// A future that waits for a freshly drawn delay
    pub fn delay(&self) -> impl Future<Output = Duration> + Send + 'static {
        let scheduler = Arc::clone(&self.scheduler);
        let delay = self.next_delay();
        async move {
            scheduler.sleep(delay).await;
            delay
        }
    }
}

impl std::fmt::Debug for SimulatedLatency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLatency")
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}
