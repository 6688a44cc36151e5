//! # VetSync Engine
//!
//! Sync queue manager and reconciliation puller for VetSync.
//!
//! This crate provides the two halves of eventual consistency:
//! - [`SyncQueueManager`] records mutations made while disconnected and
//!   replays them against the server in creation order once connectivity
//!   returns
//! - [`ReconciliationPuller`] pulls server-side deltas into the local
//!   store when it is safe to do so
//!
//! ## Key Invariants
//!
//! - The server is authoritative on pull
//! - A drain pass claims each operation (`pending → in-flight`) before
//!   dispatching it, so concurrent drain triggers cannot double-send
//! - A mid-queue failure does not block later unrelated operations; an
//!   auth failure or connectivity loss halts the pass with everything
//!   undispatched still pending
//! - The puller skips whenever unconfirmed local intent is queued, and
//!   never applies server-reported deletes

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod invalidate;
mod puller;
mod queue;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use http::{HttpClient, HttpError, MockHttpClient};
pub use invalidate::{NoopInvalidator, ReadCacheInvalidator, RecordingInvalidator};
pub use puller::{PullOutcome, ReconciliationPuller, SkipReason};
pub use queue::{DrainHalt, DrainOutcome, DrainReport, SyncQueueManager};
