//! Progress, completion and cancellation plumbing between a run and its host.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The scan found no models.
    NothingToDo,
    /// Every item was attempted.
    Completed,
    /// The run stopped early on request.
    Cancelled,
}

/// Final tally of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Items found by the scan.
    pub total: usize,
    /// Items attempted before the run ended.
    pub processed: usize,
    /// Items whose outputs were written.
    pub exported: usize,
    /// Items that failed.
    pub failed: usize,
    /// Source paths of the failed items, in processing order.
    pub failed_items: Vec<PathBuf>,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            exported: 0,
            failed: 0,
            failed_items: Vec::new(),
            outcome: BatchOutcome::Completed,
        }
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            BatchOutcome::NothingToDo => write!(f, "No models found, nothing to do"),
            BatchOutcome::Completed => write!(
                f,
                "Exported {} of {} models ({} failed)",
                self.exported, self.total, self.failed
            ),
            BatchOutcome::Cancelled => write!(
                f,
                "Cancelled after {} of {} models: {} exported, {} failed",
                self.processed, self.total, self.exported, self.failed
            ),
        }
    }
}

/// Receives progress and the final report of a run.
pub trait BatchSink {
    /// Fraction of items processed, in `[0, 1]`. Reset to 0 when the run ends.
    fn progress(&mut self, fraction: f32);

    /// Called exactly once, when the run ends.
    fn finished(&mut self, report: &BatchReport);
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl BatchSink for NullSink {
    fn progress(&mut self, _fraction: f32) {}
    fn finished(&mut self, _report: &BatchReport) {}
}

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop. Cannot be undone.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
