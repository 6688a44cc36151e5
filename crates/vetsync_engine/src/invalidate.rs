//! The read-cache invalidation seam.
//!
//! After a confirmed push or an applied pull, cached API reads for the
//! touched entity are stale. The engine reports which paths changed
//! through this trait; the cache crate's router implements it, and
//! headless deployments use [`NoopInvalidator`].

use parking_lot::Mutex;

/// Receives the read paths made stale by a confirmed sync.
pub trait ReadCacheInvalidator: Send + Sync {
    /// Drops any cached responses for the given request paths.
    fn invalidate(&self, paths: &[String]);
}

/// An invalidator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl ReadCacheInvalidator for NoopInvalidator {
    fn invalidate(&self, _paths: &[String]) {}
}

/// A test invalidator that records every path it is handed.
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all paths invalidated so far, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

impl ReadCacheInvalidator for RecordingInvalidator {
    fn invalidate(&self, paths: &[String]) {
        self.paths.lock().extend_from_slice(paths);
    }
}
