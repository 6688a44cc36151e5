//! Store directory management.
//!
//! This module handles the file system layout of the local store:
//!
//! ```text
//! <root>/
//! ├─ LOCK                        # Advisory lock for single-writer
//! └─ tenants/
//!    └─ <tenant_id>/store.log    # One framed log per tenant
//! ```
//!
//! The LOCK file ensures only one process writes the store at a time.
//! Tenant namespaces are directories: isolation is a property of the
//! layout, not of any query filter.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const TENANTS_DIR: &str = "tenants";
const TENANT_LOG_FILE: &str = "store.log";

/// Manages the store directory structure and file locking.
///
/// # Thread Safety
///
/// The `StoreDir` holds an exclusive lock on the store directory. Only one
/// `StoreDir` instance can exist per directory at a time.
#[derive(Debug)]
pub(crate) struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory and acquires its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns [`StoreError::Locked`])
    /// - I/O errors occur
    pub(crate) fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::MissingDirectory(path.display().to_string()));
            }
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to one tenant's log file.
    pub(crate) fn tenant_log_path(&self, tenant_id: &str) -> PathBuf {
        self.path.join(TENANTS_DIR).join(tenant_id).join(TENANT_LOG_FILE)
    }

    /// Lists the tenant ids that have a provisioned namespace.
    pub(crate) fn list_tenants(&self) -> StoreResult<Vec<String>> {
        let tenants = self.path.join(TENANTS_DIR);
        if !tenants.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&tenants)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Syncs a directory to ensure metadata updates (renames, deletes) are
/// durable.
///
/// On Windows the NTFS journal provides equivalent metadata durability, so
/// the explicit fsync is skipped.
#[cfg(unix)]
pub(crate) fn sync_directory(path: &Path) -> StoreResult<()> {
    let dir = File::open(path)?;
    dir.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_directory(_path: &Path) -> StoreResult<()> {
    Ok(())
}
