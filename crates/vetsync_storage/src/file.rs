//! File-backed storage.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-backed byte store.
///
/// One backend owns one log file; every tenant store and every cache
/// namespace gets its own. The file is opened in append mode, so writes
/// always land at the tail even after a replay scan has moved the read
/// cursor.
///
/// # Durability
///
/// - `flush()` pushes buffered bytes to the OS
/// - `sync()` calls `File::sync_all()` so the bytes survive power loss
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FileBackend {
    /// Opens or creates the log file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    /// Opens the log file, creating missing parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.len;
        self.file.write_all(data)?;
        self.len += data.len() as u64;
        Ok(offset)
    }

    fn read_all(&self) -> StorageResult<Vec<u8>> {
        // `&File` is Read + Seek; append mode keeps subsequent writes at
        // the tail regardless of where this leaves the cursor.
        let mut reader = &self.file;
        reader.seek(SeekFrom::Start(0))?;

        let mut buffer = Vec::with_capacity(self.len as usize);
        reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.len)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.log");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn appends_accumulate_at_the_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.log");

        let mut backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.append(b"hello").unwrap(), 0);
        assert_eq!(backend.append(b" world").unwrap(), 5);

        assert_eq!(backend.size().unwrap(), 11);
        assert_eq!(backend.read_all().unwrap(), b"hello world");
    }

    #[test]
    fn reading_does_not_displace_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.log");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"first").unwrap();

        // A replay-style scan followed by another append
        assert_eq!(backend.read_all().unwrap(), b"first");
        backend.append(b" second").unwrap();

        assert_eq!(backend.read_all().unwrap(), b"first second");
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.log");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 15);
        assert_eq!(backend.read_all().unwrap(), b"persistent data");
    }

    #[test]
    fn open_with_create_dirs_builds_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tenants").join("t1").join("store.log");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert_eq!(backend.path(), path);
        assert!(path.exists());
    }
}
