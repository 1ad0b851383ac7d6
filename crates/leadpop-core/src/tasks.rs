//! Bounded pool for detached background work.
//!
//! Work submitted here runs without the caller waiting on it, but it is never
//! fire-and-forget: failures go to the log with the task's name, at most
//! `max_in_flight` tasks run at once, and `drain` waits for all of them.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
}

impl BackgroundTasks {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Runs `work` in the background. An `Err` is logged under `name`.
    pub fn spawn<F>(&self, name: impl Into<String>, work: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let permits = Arc::clone(&self.permits);
        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::warn!(task = %name, "background pool closed; task dropped");
                return;
            };
            tracing::debug!(task = %name, "background task started");
            match work.await {
                Ok(()) => tracing::debug!(task = %name, "background task finished"),
                Err(e) => tracing::error!(task = %name, error = ?e, "background task failed"),
            }
        });
    }

    /// Tasks spawned and not yet finished (including those waiting for a slot).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Closes the tracker and waits for every submitted task to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
