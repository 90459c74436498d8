//! Pass options and cooperative cancellation

use rigcheck_core::ValueComparer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Settings shared by validate and repair passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    pub comparer: ValueComparer,
    /// Apply each source node's connection repairs as one atomic batch
    /// when the scene supports it
    pub atomic_batches: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            comparer: ValueComparer::default(),
            atomic_batches: true,
        }
    }
}

/// Requests that a running pass stop.
///
/// Passes check the token between source nodes only, so a node is never
/// left half validated or half repaired.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
