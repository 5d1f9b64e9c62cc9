//! # Airfare Testing
//!
//! Testing utilities and helpers for the Airfare booking architecture.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - Test helpers (scoped tracing output)
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use airfare_testing::{TestScheduler, test_clock};
//! use airfare_runtime::Store;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_batch_completes() {
//!     let env = desk_environment(TestScheduler::virtual_time(), test_clock());
//!     let store = Store::new(BookingState::default(), BookingReducer, env);
//!
//!     let mut handle = store.send(BookingAction::BookAll { user_ids }).await?;
//!     handle.wait().await;
//!
//!     let tickets = store.state(|s| s.tickets.len()).await;
//!     assert_eq!(tickets, 5);
//! }
//! ```

use airfare_core::environment::{Clock, Scheduler};
use airfare_core::task::TaskHandle;
use chrono::{DateTime, Utc};


pub use reducer_test::{ReducerTest, assertions};

/// Deterministic implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Scheduler, TaskHandle, Utc};
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use airfare_testing::mocks::FixedClock;
    /// use airfare_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SleepMode {
        Instant,
        Virtual,
    }

    /// Scheduler for tests
    ///
    /// Records every sleep it is asked for. In instant mode the sleeps resolve
    /// immediately; in virtual-time mode they are tokio timers, which follow
    /// the paused clock of `#[tokio::test(start_paused = true)]`.
    ///
    /// Tasks are spawned on the current tokio runtime in both modes.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let scheduler = TestScheduler::instant();
    /// scheduler.sleep(Duration::from_secs(3)).await; // returns at once
    /// assert_eq!(scheduler.requested_sleeps(), vec![Duration::from_secs(3)]);
    /// ```
    #[derive(Debug, Clone)]
    pub struct TestScheduler {
        mode: SleepMode,
        requested: Arc<Mutex<Vec<Duration>>>,
    }

    impl TestScheduler {
        /// Scheduler whose sleeps complete immediately
        #[must_use]
        pub fn instant() -> Self {
            Self::with_mode(SleepMode::Instant)
        }

        /// Scheduler whose sleeps run on tokio's (possibly paused) clock
        #[must_use]
        pub fn virtual_time() -> Self {
            Self::with_mode(SleepMode::Virtual)
        }

        fn with_mode(mode: SleepMode) -> Self {
            Self {
                mode,
                requested: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Every sleep requested so far, in request order
        #[must_use]
        pub fn requested_sleeps(&self) -> Vec<Duration> {
            self.requested
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Sum of every sleep requested so far
        #[must_use]
        pub fn total_requested(&self) -> Duration {
            self.requested_sleeps().into_iter().sum()
        }
    }

    impl Scheduler for TestScheduler {
        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
            self.requested
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(duration);

            match self.mode {
                SleepMode::Instant => futures::future::ready(()).boxed(),
                SleepMode::Virtual => tokio::time::sleep(duration).boxed(),
            }
        }

        fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle {
            let (task, handle) = TaskHandle::prepare(task);
            tokio::spawn(task);
            handle
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output of the current test through the test harness
    ///
    /// The filter comes from `RUST_LOG` and defaults to `debug`. Calling this
    /// more than once is harmless; only the first subscriber is installed.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, TestScheduler, test_clock};
