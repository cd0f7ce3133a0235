//! Bounded parallel execution of per-block work, and progress reporting.
//!
//! Every per-block stage runs through an [`Executor`]. The rayon executor
//! processes blocks in windows of `max_in_flight`, so at most that many block
//! buffers are alive at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::Stage;

/// Runs a fallible closure over a slice of work items.
///
/// Results come back in input order regardless of completion order. When
/// several items fail, the error of the lowest failing window is returned.
pub trait Executor: Sync {
    fn try_map<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync;

    fn try_for_each<T, E, F>(&self, items: &[T], f: F) -> Result<(), E>
    where
        T: Sync,
        E: Send,
        F: Fn(&T) -> Result<(), E> + Sync,
    {
        self.try_map(items, f).map(|_| ())
    }
}

/// Parallel executor on the global rayon pool.
#[derive(Debug, Clone, Copy)]
pub struct RayonExecutor {
    max_in_flight: usize,
}

impl RayonExecutor {
    /// # Panics
    ///
    /// Panics if `max_in_flight` is 0.
    pub fn new(max_in_flight: usize) -> Self {
        assert!(max_in_flight > 0, "max_in_flight must be > 0");
        Self { max_in_flight }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

impl Executor for RayonExecutor {
    fn try_map<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        let mut results = Vec::with_capacity(items.len());
        for window in items.chunks(self.max_in_flight) {
            let window_results: Result<Vec<R>, E> = window.par_iter().map(&f).collect();
            results.extend(window_results?);
        }
        Ok(results)
    }
}

/// Runs items one at a time on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn try_map<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        items.iter().map(f).collect()
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress of one per-block stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    /// Blocks finished so far in this stage.
    pub completed: usize,
    pub total: usize,
}

/// Callback type for progress reporting.
pub type ProgressCallback = Option<Arc<dyn Fn(Progress) + Send + Sync>>;

/// Counts finished blocks of a stage and forwards them to the callback.
pub(crate) struct ProgressTracker<'a> {
    callback: &'a ProgressCallback,
    stage: Stage,
    total: usize,
    completed: AtomicUsize,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(callback: &'a ProgressCallback, stage: Stage, total: usize) -> Self {
        Self {
            callback,
            stage,
            total,
            completed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn block_done(&self) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(f) = self.callback.as_ref() {
            f(Progress {
                stage: self.stage,
                completed,
                total: self.total,
            });
        }
    }
}
