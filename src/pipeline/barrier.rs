//! Run completion tracking
//!
//! A counter/wait primitive: one increment per task accepted into the
//! pipeline, one decrement per terminal resolution. The run finalizes only
//! once the counter returns to zero. Requeued write attempts do not touch
//! the counter, so a task stays outstanding until it truly resolves.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counter that `wait` callers can block on until it drains to zero
pub struct WaitGroup {
    count: AtomicUsize,
    notify: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    /// Records `n` more outstanding tasks.
    pub fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::AcqRel);
    }

    /// Records one terminal resolution.
    pub fn done(&self) {
        let previous = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "done() without matching add()");
        if previous == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Current number of outstanding tasks
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Resolves once the counter reaches zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking, so a done() racing with the check
            // cannot slip between the load and the await.
            notified.as_mut().enable();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
