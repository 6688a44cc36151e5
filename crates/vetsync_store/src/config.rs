//! Configuration for the local store.

/// Configuration for opening a [`crate::LocalStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Create the store directory if it does not exist.
    pub create_if_missing: bool,
    /// Fsync the tenant log after every committed record.
    ///
    /// Disable only in tests; the engine's durability guarantee rests on
    /// this.
    pub sync_on_commit: bool,
}

impl StoreConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets whether to fsync after each committed record.
    #[must_use]
    pub fn with_sync_on_commit(mut self, sync: bool) -> Self {
        self.sync_on_commit = sync;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
