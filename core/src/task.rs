//! Task handles and cancellation primitives.
//!
//! [`TaskHandle`] is what a [`Scheduler`](crate::environment::Scheduler)
//! returns for a submitted task. [`CancellationToken`] is a cloneable signal
//! that any number of tasks can wait on.

use futures::future::{AbortHandle, Abortable, BoxFuture};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

/// How a submitted task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The task ran to completion
    Completed,
    /// The task was cancelled (or dropped by its executor) before finishing
    Cancelled,
}

/// Handle to a task submitted through a scheduler
///
/// Dropping the handle detaches the task; it keeps running.
#[derive(Debug)]
pub struct TaskHandle {
    abort: AbortHandle,
    done: oneshot::Receiver<TaskExit>,
}

impl TaskHandle {
    /// Wrap `task` so that it can be cancelled through the returned handle
    ///
    /// Executors spawn the returned future and hand the handle back to the
    /// caller. The wrapped future reports its exit through the handle.
    #[must_use]
    pub fn prepare(task: BoxFuture<'static, ()>) -> (BoxFuture<'static, ()>, Self) {
        let (abort, registration) = AbortHandle::new_pair();
        let (done_tx, done_rx) = oneshot::channel();

        let wrapped = async move {
            let exit = match Abortable::new(task, registration).await {
                Ok(()) => TaskExit::Completed,
                Err(_) => TaskExit::Cancelled,
            };
            let _ = done_tx.send(exit);
        };

        (
            Box::pin(wrapped),
            Self {
                abort,
                done: done_rx,
            },
        )
    }

    /// Cancel the task
    ///
    /// The task stops at its next suspension point. Cancelling a finished
    /// task has no effect.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Wait for the task to end
    pub async fn join(self) -> TaskExit {
        self.done.await.unwrap_or(TaskExit::Cancelled)
    }
}

/// Cloneable cancellation signal
///
/// All clones observe the same signal. Once cancelled, a token stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal cancellation to every waiter
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether the token has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
