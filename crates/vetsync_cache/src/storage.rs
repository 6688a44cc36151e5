//! Namespace persistence.
//!
//! Each namespace lives in its own framed log file under the cache root,
//! named after the rendered [`CacheName`]. Version activation and cache
//! clearing are wholesale file deletions; entries are never migrated
//! between versions.

use crate::error::CacheResult;
use crate::namespace::{CacheName, CacheNamespace};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vetsync_storage::{FileBackend, FramedLog, InMemoryBackend};

/// Opens, lists, and deletes namespace files under a cache root.
#[derive(Debug)]
pub struct CacheStorage {
    mode: Mode,
}

#[derive(Debug)]
enum Mode {
    Disk(PathBuf),
    Memory,
}

impl CacheStorage {
    /// Opens (creating if needed) a cache root directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> CacheResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            mode: Mode::Disk(root.to_path_buf()),
        })
    }

    /// Creates an ephemeral storage for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { mode: Mode::Memory }
    }

    /// Opens a namespace, replaying its file if one exists.
    ///
    /// A corrupt namespace file is not an error: it is logged, deleted,
    /// and replaced with an empty namespace (a cache never holds the only
    /// copy of anything).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or recreated.
    pub fn open_namespace(&self, name: &CacheName, max_items: usize) -> CacheResult<CacheNamespace> {
        let Mode::Disk(root) = &self.mode else {
            return Ok(CacheNamespace::ephemeral(name.clone(), max_items));
        };

        let path = root.join(name.file_name());
        let log = FramedLog::new(Box::new(FileBackend::open(&path)?), false);
        match CacheNamespace::open(name.clone(), max_items, log) {
            Ok(namespace) => Ok(namespace),
            Err(err) => {
                warn!(namespace = %name, error = %err, "corrupt cache namespace, starting empty");
                fs::remove_file(&path)?;
                let log = FramedLog::new(Box::new(FileBackend::open(&path)?), false);
                Ok(CacheNamespace::open(name.clone(), max_items, log)?)
            }
        }
    }

    /// Lists the namespace files present under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read.
    pub fn list(&self) -> CacheResult<Vec<CacheName>> {
        let Mode::Disk(root) = &self.mode else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".log")) else {
                continue;
            };
            if let Some(name) = CacheName::parse(stem) {
                names.push(name);
            }
        }
        names.sort_by_key(CacheName::render);
        Ok(names)
    }

    /// Deletes every namespace whose version token differs from `version`.
    ///
    /// Returns the deleted names.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be deleted.
    pub fn activate(&self, version: &str) -> CacheResult<Vec<CacheName>> {
        let Mode::Disk(root) = &self.mode else {
            return Ok(Vec::new());
        };

        let mut deleted = Vec::new();
        for name in self.list()? {
            if name.token != version {
                fs::remove_file(root.join(name.file_name()))?;
                deleted.push(name);
            }
        }
        if !deleted.is_empty() {
            sync_directory(root)?;
            info!(version, count = deleted.len(), "deleted stale cache namespaces");
        }
        Ok(deleted)
    }

    /// Deletes every namespace file. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be deleted.
    pub fn clear_all(&self) -> CacheResult<usize> {
        let Mode::Disk(root) = &self.mode else {
            return Ok(0);
        };

        let names = self.list()?;
        for name in &names {
            fs::remove_file(root.join(name.file_name()))?;
        }
        if !names.is_empty() {
            sync_directory(root)?;
        }
        Ok(names.len())
    }
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> std::io::Result<()> {
    fs::File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
