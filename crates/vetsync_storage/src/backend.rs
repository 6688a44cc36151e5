//! Storage backend trait definition.

use crate::error::StorageResult;

/// A byte sink for one append-only log.
///
/// The framed log drives its backend through exactly two data paths:
/// appends at the tail while running, and one full scan at open to replay
/// state. The trait mirrors that shape instead of offering a general
/// random-access surface. Backends stay opaque byte stores - framing,
/// checksums, and record semantics all live in [`FramedLog`].
///
/// A backend is owned by a single [`FramedLog`], which serializes access,
/// so implementations carry plain state and no locks of their own.
///
/// [`FramedLog`]: crate::FramedLog
pub trait StorageBackend: Send + Sync {
    /// Appends bytes at the tail, returning the offset they start at.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Reads the complete contents, for replay at open.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn read_all(&self) -> StorageResult<Vec<u8>>;

    /// Returns the current size in bytes (the next append offset).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Pushes buffered writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Forces data and metadata to durable storage.
    ///
    /// Stronger than `flush`: after this returns, the bytes survive power
    /// loss, not just process death.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;
}
