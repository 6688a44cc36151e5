//! Framed append-only log.
//!
//! Every record is wrapped in a fixed envelope:
//!
//! ```text
//! magic (4) + version (2, LE) + kind (1) + length (4, LE) + payload + crc32 (4, LE)
//! ```
//!
//! The CRC32 (IEEE polynomial) covers everything before it. Readers treat a
//! truncated tail record as end-of-log (crash tolerance) and a checksum
//! mismatch as an error. The log does not interpret payloads - record kinds
//! and payload encodings belong to the layers above.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;

/// Magic bytes identifying a VetSync log record.
pub const LOG_MAGIC: [u8; 4] = *b"VSLG";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + kind (1) + length (4).
const HEADER_SIZE: usize = 11;

/// CRC size.
const CRC_SIZE: usize = 4;

/// An append-only log of framed records over a storage backend.
///
/// The log is the single durability primitive of the engine: the per-tenant
/// local store and every cache namespace are each one `FramedLog`.
///
/// # Example
///
/// ```rust
/// use vetsync_storage::{FramedLog, InMemoryBackend};
///
/// let log = FramedLog::new(Box::new(InMemoryBackend::new()), false);
/// log.append(1, b"payload").unwrap();
///
/// let records: Vec<_> = log.iter().unwrap().map(|r| r.unwrap()).collect();
/// assert_eq!(records[0].1, 1);
/// assert_eq!(records[0].2, b"payload");
/// ```
pub struct FramedLog {
    backend: Mutex<Box<dyn StorageBackend>>,
    sync_on_write: bool,
}

impl FramedLog {
    /// Creates a new framed log over the given backend.
    ///
    /// When `sync_on_write` is true, every append is flushed before
    /// returning. This is the atomic transaction scope of the local store.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_write: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            sync_on_write,
        }
    }

    /// Appends a record to the log.
    ///
    /// Returns the offset where the record envelope starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exceeds the 4-byte length field or
    /// an I/O error occurs.
    pub fn append(&self, kind: u8, payload: &[u8]) -> StorageResult<u64> {
        let len = u32::try_from(payload.len())
            .map_err(|_| StorageError::PayloadTooLarge(payload.len()))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&LOG_MAGIC);
        data.extend_from_slice(&LOG_VERSION.to_le_bytes());
        data.push(kind);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(payload);

        let crc = compute_crc32(&data);
        data.extend_from_slice(&crc.to_le_bytes());

        let mut backend = self.backend.lock();
        let offset = backend.append(&data)?;

        if self.sync_on_write {
            backend.flush()?;
        }

        Ok(offset)
    }

    /// Flushes all pending writes to durable storage.
    pub fn flush(&self) -> StorageResult<()> {
        self.backend.lock().flush()
    }

    /// Syncs data and metadata to durable storage.
    pub fn sync(&self) -> StorageResult<()> {
        self.backend.lock().sync()
    }

    /// Returns the current log size in bytes.
    pub fn size(&self) -> StorageResult<u64> {
        self.backend.lock().size()
    }

    /// Returns an iterator over log records.
    ///
    /// Records are yielded as `(offset, kind, payload)` tuples in the order
    /// they were appended. The iterator works on a snapshot taken here, so
    /// appends made after this call are not observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn iter(&self) -> StorageResult<LogIter> {
        let data = self.backend.lock().read_all()?;
        Ok(LogIter::new(data))
    }
}

impl std::fmt::Debug for FramedLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedLog")
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}

/// An iterator over framed log records, parsing a replay snapshot.
///
/// Owning the snapshot keeps the log free for appends while a replay is
/// in progress.
///
/// # Error Handling
///
/// - Truncated records (incomplete header or payload) end iteration
/// - Invalid magic bytes or unsupported versions are corruption errors
/// - CRC mismatches are errors
pub struct LogIter {
    data: Vec<u8>,
    offset: usize,
    finished: bool,
}

impl LogIter {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            offset: 0,
            finished: false,
        }
    }

    fn read_next(&mut self) -> StorageResult<Option<(u64, u8, Vec<u8>)>> {
        let start = self.offset;

        if self.data.len() - start < HEADER_SIZE {
            // Incomplete header - torn tail, treat as end
            self.finished = true;
            return Ok(None);
        }

        let header = &self.data[start..start + HEADER_SIZE];

        if header[0..4] != LOG_MAGIC {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "invalid magic at offset {start}"
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > LOG_VERSION {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "unsupported log version {version} at offset {start}"
            )));
        }

        let kind = header[6];
        let payload_len =
            u32::from_le_bytes([header[7], header[8], header[9], header[10]]) as usize;
        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;

        if self.data.len() - start < total_len {
            // Incomplete record - torn tail, treat as end
            self.finished = true;
            return Ok(None);
        }

        let body = &self.data[start..start + total_len];
        let crc_start = HEADER_SIZE + payload_len;
        let stored = u32::from_le_bytes([
            body[crc_start],
            body[crc_start + 1],
            body[crc_start + 2],
            body[crc_start + 3],
        ]);
        let computed = compute_crc32(&body[..crc_start]);

        if stored != computed {
            self.finished = true;
            return Err(StorageError::ChecksumMismatch { stored, computed });
        }

        let payload = body[HEADER_SIZE..crc_start].to_vec();
        self.offset += total_len;

        Ok(Some((start as u64, kind, payload)))
    }
}

impl Iterator for LogIter {
    type Item = StorageResult<(u64, u8, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Computes a CRC32 checksum (IEEE polynomial) over the data.
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use proptest::prelude::*;

    fn memory_log() -> FramedLog {
        FramedLog::new(Box::new(InMemoryBackend::new()), false)
    }

    #[test]
    fn append_and_iterate() {
        let log = memory_log();
        log.append(1, b"first").unwrap();
        log.append(2, b"second").unwrap();

        let records: Vec<_> = log.iter().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, 1);
        assert_eq!(records[0].2, b"first");
        assert_eq!(records[1].1, 2);
        assert_eq!(records[1].2, b"second");
    }

    #[test]
    fn empty_log_yields_nothing() {
        let log = memory_log();
        assert!(log.iter().unwrap().next().is_none());
    }

    #[test]
    fn empty_payload_roundtrips() {
        let log = memory_log();
        log.append(7, b"").unwrap();

        let records: Vec<_> = log.iter().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, 7);
        assert!(records[0].2.is_empty());
    }

    #[test]
    fn torn_tail_is_end_of_log() {
        let mut data = {
            let log = memory_log();
            log.append(1, b"complete").unwrap();
            log.append(2, b"will be torn").unwrap();
            let bytes = log.backend.lock().read_all().unwrap();
            bytes
        };

        // Cut the second record short
        data.truncate(data.len() - 5);

        let log = FramedLog::new(Box::new(InMemoryBackend::with_data(data)), false);
        let records: Vec<_> = log.iter().unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().2, b"complete");
    }

    #[test]
    fn corrupt_crc_is_error() {
        let mut data = {
            let log = memory_log();
            log.append(1, b"record").unwrap();
            let bytes = log.backend.lock().read_all().unwrap();
            bytes
        };

        // Flip a payload byte, leaving the stored CRC stale
        let idx = HEADER_SIZE + 2;
        data[idx] ^= 0xFF;

        let log = FramedLog::new(Box::new(InMemoryBackend::with_data(data)), false);
        let mut iter = log.iter().unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(StorageError::ChecksumMismatch { .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn invalid_magic_is_error() {
        let log = FramedLog::new(
            Box::new(InMemoryBackend::with_data(vec![0xDE; 32])),
            false,
        );
        let mut iter = log.iter().unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(StorageError::Corrupted(_)))
        ));
    }

    #[test]
    fn crc32_known_value() {
        // Known test vector: "123456789" should give 0xCBF43926
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc32_empty() {
        assert_eq!(compute_crc32(b""), 0x0000_0000);
    }

    proptest! {
        #[test]
        fn arbitrary_records_roundtrip(
            records in proptest::collection::vec(
                (0u8..=255, proptest::collection::vec(any::<u8>(), 0..256)),
                0..32,
            )
        ) {
            let log = memory_log();
            for (kind, payload) in &records {
                log.append(*kind, payload).unwrap();
            }

            let read: Vec<_> = log.iter().unwrap().map(|r| r.unwrap()).collect();
            prop_assert_eq!(read.len(), records.len());
            for ((_, kind, payload), (expected_kind, expected_payload)) in
                read.iter().zip(records.iter())
            {
                prop_assert_eq!(kind, expected_kind);
                prop_assert_eq!(payload, expected_payload);
            }
        }
    }
}
