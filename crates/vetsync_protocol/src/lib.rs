//! # VetSync Protocol
//!
//! Shared protocol types for the VetSync offline engine.
//!
//! This crate holds the pure data types every other engine crate speaks:
//! the tenant identity, the tracked entity catalogue and its REST endpoint
//! table, entity records and queued mutations, the shell control protocol,
//! the reconciliation pull wire format, and a minimal HTTP value model.
//!
//! ## Key Invariants
//!
//! - A [`TenantContext`] fails closed: it cannot be constructed with any
//!   empty component, so nothing downstream ever runs without a resolved
//!   tenant
//! - [`EntityType`] is a closed enum - adding a tracked type is a
//!   compile-time-checked change
//! - Control messages are sum types handled by exhaustive `match`

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod http;
mod messages;
mod operation;
mod pull;
mod record;
mod tenant;
mod time;

pub use entity::EntityType;
pub use error::{ProtocolError, ProtocolResult};
pub use http::{HttpRequest, HttpResponse, Method};
pub use messages::{RouterMessage, ShellMessage};
pub use operation::{OperationKind, OperationStatus, SyncOperation};
pub use pull::{ChangeEntry, PullQuery, PullResponse};
pub use record::{EntityRecord, SyncState};
pub use tenant::TenantContext;
pub use time::now_ms;
