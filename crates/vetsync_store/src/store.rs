//! The tenant-scoped local store.

use crate::config::StoreConfig;
use crate::dir::StoreDir;
use crate::error::StoreResult;
use crate::tenant::TenantStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use vetsync_protocol::TenantContext;
use vetsync_storage::{FileBackend, InMemoryBackend};

/// The durable local store, holding one namespace per tenant.
///
/// The store is the only shared mutable resource of the engine. Access
/// always goes through [`LocalStore::tenant`] with a resolved
/// [`TenantContext`]; there is no cross-tenant API, so isolation is a
/// structural property rather than a runtime check.
///
/// # Example
///
/// ```no_run
/// use vetsync_store::{LocalStore, StoreConfig};
/// use vetsync_protocol::{EntityType, SyncState, TenantContext};
/// use std::path::Path;
///
/// let store = LocalStore::open(Path::new("vetsync-data"), StoreConfig::new()).unwrap();
/// let ctx = TenantContext::new("clinic-7", "user-42", "practice-1").unwrap();
///
/// let tenant = store.tenant(&ctx).unwrap();
/// tenant.put(
///     EntityType::Pets,
///     "p1",
///     serde_json::json!({ "name": "Biscuit" }),
///     SyncState::Synced,
/// ).unwrap();
/// ```
pub struct LocalStore {
    mode: StoreMode,
    config: StoreConfig,
    tenants: Mutex<HashMap<String, Arc<TenantStore>>>,
}

enum StoreMode {
    Disk(StoreDir),
    Memory,
}

impl LocalStore {
    /// Opens or creates a store rooted at the given path.
    ///
    /// Acquires an exclusive advisory lock on the directory; a second
    /// process opening the same root fails with [`StoreError::Locked`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing (and creation was not
    /// requested), locked, or inaccessible.
    ///
    /// [`StoreError::Locked`]: crate::StoreError::Locked
    pub fn open(path: &Path, config: StoreConfig) -> StoreResult<Self> {
        let dir = StoreDir::open(path, config.create_if_missing)?;
        Ok(Self {
            mode: StoreMode::Disk(dir),
            config,
            tenants: Mutex::new(HashMap::new()),
        })
    }

    /// Opens an ephemeral in-memory store for tests.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self {
            mode: StoreMode::Memory,
            config: StoreConfig::new().with_sync_on_commit(false),
            tenants: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the tenant namespace for the given context, provisioning it
    /// on first access (idempotent).
    ///
    /// This is the sole entry point to stored data: the returned handle is
    /// scoped to the context's tenant and cannot reach any other.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant's log cannot be opened or replayed.
    pub fn tenant(&self, ctx: &TenantContext) -> StoreResult<Arc<TenantStore>> {
        let mut tenants = self.tenants.lock();

        if let Some(tenant) = tenants.get(ctx.tenant_id()) {
            return Ok(Arc::clone(tenant));
        }

        let tenant = match &self.mode {
            StoreMode::Disk(dir) => {
                let log_path = dir.tenant_log_path(ctx.tenant_id());
                let backend = FileBackend::open_with_create_dirs(&log_path)?;
                info!(tenant = %ctx.tenant_id(), "provisioned tenant namespace");
                TenantStore::open(
                    ctx.tenant_id(),
                    Box::new(backend),
                    Some(log_path),
                    self.config.sync_on_commit,
                )?
            }
            StoreMode::Memory => TenantStore::open(
                ctx.tenant_id(),
                Box::new(InMemoryBackend::new()),
                None,
                false,
            )?,
        };

        let tenant = Arc::new(tenant);
        tenants.insert(ctx.tenant_id().to_string(), Arc::clone(&tenant));
        Ok(tenant)
    }

    /// Lists the tenant ids with a provisioned namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenants directory cannot be read.
    pub fn list_tenants(&self) -> StoreResult<Vec<String>> {
        match &self.mode {
            StoreMode::Disk(dir) => dir.list_tenants(),
            StoreMode::Memory => {
                let mut ids: Vec<String> = self.tenants.lock().keys().cloned().collect();
                ids.sort();
                Ok(ids)
            }
        }
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
