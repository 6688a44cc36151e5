//! # VetSync Store
//!
//! Tenant-scoped durable local store for the VetSync offline engine.
//!
//! The store provides CRUD over entity records, the mutation queue, and the
//! sync watermark, all surviving process restarts. Isolation between
//! tenants is structural: every tenant gets its own append-only log file
//! and its own in-memory state, reached only through
//! [`LocalStore::tenant`]. There is no API that reads across tenants, so no
//! query can leak data even by programming error.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├─ LOCK                        advisory lock, single writer
//! └─ tenants/<tenant_id>/store.log
//! ```
//!
//! ## Durability
//!
//! Every `put`, `delete`, `enqueue`, and status change appends one framed
//! record to the tenant's log (and fsyncs it when `sync_on_commit` is set):
//! that append is the atomic transaction scope. Opening a tenant replays
//! its log; a torn tail record is tolerated, a checksum mismatch is an
//! error.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod record;
mod store;
mod tenant;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use record::StoreRecord;
pub use store::LocalStore;
pub use tenant::TenantStore;
