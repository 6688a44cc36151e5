//! # VetSync Storage
//!
//! Storage backend trait and framed append-only log for VetSync.
//!
//! This crate provides the lowest-level durability abstraction for the
//! offline sync engine. Storage backends are **opaque byte stores** - they
//! do not interpret the data they store. The framed log layered on top
//! gives every higher layer (the local store, the cache namespaces) the
//! same crash-tolerant record envelope.
//!
//! ## Design Principles
//!
//! - Backends match the log's access pattern: append at the tail, scan
//!   everything at open
//! - No knowledge of store records, queue entries, or cache entries
//! - A truncated tail record is treated as end-of-log, a corrupt
//!   checksum is an error
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use vetsync_storage::{FramedLog, InMemoryBackend};
//!
//! let log = FramedLog::new(Box::new(InMemoryBackend::new()), false);
//! log.append(1, b"hello world").unwrap();
//!
//! let records: Vec<_> = log.iter().unwrap().map(|r| r.unwrap()).collect();
//! assert_eq!(records[0].2, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod log;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use log::{compute_crc32, FramedLog, LogIter, LOG_MAGIC, LOG_VERSION};
pub use memory::InMemoryBackend;
