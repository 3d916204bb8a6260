//! Single-writer render progress with an atomic admission gate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{RenderError, RenderResult};

/// Polled view of the in-flight render.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressSnapshot {
    pub is_processing: bool,
    pub current_task: String,
    pub completed_steps: u32,
    pub total_steps: u32,
    /// Monotonic across renders; never reset.
    pub completed_renders: u64,
    /// Error messages recorded for the current render.
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
struct ProgressInner {
    current_task: String,
    completed_steps: u32,
    total_steps: u32,
    errors: Vec<String>,
}

/// One instance per process. The `processing` flag is the mutual-exclusion
/// gate: admission is a compare-and-set, so concurrent callers race safely
/// and exactly one wins.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    processing: AtomicBool,
    completed_renders: AtomicU64,
    inner: Mutex<ProgressInner>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single in-flight slot and reset per-render state. Fails
    /// with the currently-running task when another render holds the slot.
    pub fn begin(
        self: &Arc<Self>,
        total_steps: u32,
        first_task: &str,
    ) -> RenderResult<RenderSlot> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let current_task = self.lock_inner().current_task.clone();
            return Err(RenderError::ConcurrentRenderRejected { current_task });
        }

        {
            let mut inner = self.lock_inner();
            inner.current_task = first_task.to_string();
            inner.completed_steps = 0;
            inner.total_steps = total_steps;
            inner.errors.clear();
        }

        Ok(RenderSlot {
            tracker: Arc::clone(self),
        })
    }

    /// Mark the current step finished and name the next one.
    pub fn step(&self, next_task: &str) {
        let mut inner = self.lock_inner();
        inner.completed_steps = (inner.completed_steps + 1).min(inner.total_steps);
        inner.current_task = next_task.to_string();
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.lock_inner().errors.push(message.into());
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.lock_inner();
        ProgressSnapshot {
            is_processing: self.processing.load(Ordering::SeqCst),
            current_task: inner.current_task.clone(),
            completed_steps: inner.completed_steps,
            total_steps: inner.total_steps,
            completed_renders: self.completed_renders.load(Ordering::SeqCst),
            errors: inner.errors.clone(),
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, ProgressInner> {
        // A poisoned lock only means a stage panicked mid-update; the
        // progress fields themselves are always individually valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// RAII claim on the in-flight slot. Dropping it releases the gate on every
/// exit path; only an explicit [`RenderSlot::complete`] counts the render as
/// finished.
#[derive(Debug)]
pub struct RenderSlot {
    tracker: Arc<ProgressTracker>,
}

impl RenderSlot {
    pub fn complete(self) {
        {
            let mut inner = self.tracker.lock_inner();
            inner.completed_steps = inner.total_steps;
            inner.current_task = "Completed".to_string();
        }
        self.tracker.completed_renders.fetch_add(1, Ordering::SeqCst);
        // Drop releases the processing flag.
    }
}

impl Drop for RenderSlot {
    fn drop(&mut self) {
        self.tracker.processing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_with_the_running_task() {
        let tracker = Arc::new(ProgressTracker::new());
        let slot = tracker.begin(5, "Synthesizing narration").unwrap();
        tracker.step("Fetching background media");

        let err = tracker.begin(5, "Synthesizing narration").unwrap_err();
        match err {
            RenderError::ConcurrentRenderRejected { current_task } => {
                assert_eq!(current_task, "Fetching background media");
            }
            other => panic!("unexpected error: {other}"),
        }

        let snap = tracker.snapshot();
        assert!(snap.is_processing);
        assert_eq!(snap.current_task, "Fetching background media");
        drop(slot);
    }

    #[test]
    fn dropping_the_slot_releases_the_gate_without_counting_a_render() {
        let tracker = Arc::new(ProgressTracker::new());
        let slot = tracker.begin(3, "start").unwrap();
        drop(slot);

        let snap = tracker.snapshot();
        assert!(!snap.is_processing);
        assert_eq!(snap.completed_renders, 0);
        assert!(tracker.begin(3, "start").is_ok());
    }

    #[test]
    fn complete_fills_steps_and_bumps_the_monotonic_counter() {
        let tracker = Arc::new(ProgressTracker::new());
        let slot = tracker.begin(2, "a").unwrap();
        tracker.step("b");
        slot.complete();

        let snap = tracker.snapshot();
        assert!(!snap.is_processing);
        assert_eq!(snap.completed_steps, snap.total_steps);
        assert_eq!(snap.completed_renders, 1);

        let slot = tracker.begin(2, "a").unwrap();
        slot.complete();
        assert_eq!(tracker.snapshot().completed_renders, 2);
    }

    #[test]
    fn begin_resets_per_render_state_but_not_the_counter() {
        let tracker = Arc::new(ProgressTracker::new());
        let slot = tracker.begin(2, "a").unwrap();
        tracker.record_error("boom");
        slot.complete();

        let slot = tracker.begin(4, "fresh").unwrap();
        let snap = tracker.snapshot();
        assert!(snap.errors.is_empty());
        assert_eq!(snap.completed_steps, 0);
        assert_eq!(snap.total_steps, 4);
        assert_eq!(snap.completed_renders, 1);
        drop(slot);
    }

    #[test]
    fn steps_never_exceed_the_total() {
        let tracker = Arc::new(ProgressTracker::new());
        let _slot = tracker.begin(1, "a").unwrap();
        tracker.step("b");
        tracker.step("c");
        assert_eq!(tracker.snapshot().completed_steps, 1);
    }
}
