//! # VetSync Cache
//!
//! The edge cache router: intercepts the client shell's HTTP traffic and
//! answers it from versioned, bounded cache namespaces, the network, or a
//! blend of both, chosen per route class.
//!
//! ## Key Invariants
//!
//! - A GET response is cached iff its status is exactly 200
//! - Namespaces evict in strict insertion order (FIFO, not LRU); a
//!   refresh keeps the entry's original position
//! - Namespace names embed the deployment version token; activation
//!   deletes mismatched namespaces wholesale, never migrates entries
//! - A corrupt namespace is a cache miss, never a user-facing error
//! - Background revalidation never blocks a cached response and its
//!   failures are swallowed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod namespace;
mod router;
mod routes;
mod storage;

pub use config::{CacheLimits, RouterConfig};
pub use error::{CacheError, CacheResult};
pub use namespace::{CacheEntry, CacheKind, CacheName, CacheNamespace};
pub use router::{EdgeCacheRouter, Fetch, FetchError, ScriptedFetch, WarmReport};
pub use routes::{Classification, RouteClass, RouteTable};
pub use storage::CacheStorage;
