//! Per-job running flag: a job never overlaps itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub(super) struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    /// Marks the job running, or returns None if a run is already in progress.
    pub(super) fn try_acquire(&self) -> Option<RunningGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(Arc::clone(&self.0)))
    }

    pub(super) fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the running flag when dropped, including on panic.
#[derive(Debug)]
pub(super) struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
