//! Production implementations of the environment traits.
//!
//! [`SystemClock`] reads wall-clock time and [`TokioScheduler`] puts timers
//! and tasks on the tokio runtime the caller is running in.

use airfare_core::environment::{Clock, Scheduler};
use airfare_core::task::TaskHandle;
use airfare_core::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::time::Duration;

/// Production clock using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Scheduler backed by the tokio runtime
///
/// Sleeps are tokio timers, so they follow the paused clock in tests that use
/// `#[tokio::test(start_paused = true)]`. Tasks go to the worker pool.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle {
        let (task, handle) = TaskHandle::prepare(task);
        tokio::spawn(task);
        handle
    }
}
