//! Cancellable delayed task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs a task after a quiet period, restarting the period on every schedule.
///
/// Only the most recently scheduled task can fire. Dropping the debouncer
/// cancels a task whose quiet period has not elapsed yet; a task that has
/// already started runs to completion on its own.
///
/// Scheduling requires a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Replace any waiting task with `task`, to run after the quiet period.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Detach so cancelling the timer never interrupts a started send
            tokio::spawn(task);
        }));
    }

    /// Cancel the waiting task. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some_and(|handle| {
            let waiting = !handle.is_finished();
            handle.abort();
            waiting
        })
    }

    /// Whether a task is waiting for its quiet period to end.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_quiet_period() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_secs(2));

        debouncer.schedule(counting_task(&fired));
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_restarts_quiet_period() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_secs(2));

        for _ in 0..5 {
            debouncer.schedule(counting_task(&fired));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_prevent_firing() {
        let fired = Arc::new(AtomicUsize::new(0));

        let mut cancelled = Debouncer::new(Duration::from_secs(2));
        cancelled.schedule(counting_task(&fired));
        assert!(cancelled.cancel());
        assert!(!cancelled.cancel());

        let mut dropped = Debouncer::new(Duration::from_secs(2));
        dropped.schedule(counting_task(&fired));
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
