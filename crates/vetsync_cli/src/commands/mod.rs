//! CLI command implementations.

pub mod caches;
pub mod compact;
pub mod inspect;
pub mod queue;

use std::path::Path;
use vetsync_protocol::TenantContext;
use vetsync_store::{LocalStore, StoreConfig};

/// Opens an existing store read-side for a command (never creates one).
pub fn open_store(path: &Path) -> Result<LocalStore, Box<dyn std::error::Error>> {
    Ok(LocalStore::open(
        path,
        StoreConfig::new().with_create_if_missing(false),
    )?)
}

/// Builds the context the CLI operates under for one tenant.
///
/// Store namespaces are keyed by tenant id alone, so the tooling identity
/// used for the other components is fine here.
pub fn cli_context(tenant_id: &str) -> Result<TenantContext, Box<dyn std::error::Error>> {
    Ok(TenantContext::new(tenant_id, "cli", "cli")?)
}

/// Formats a millisecond epoch watermark for display.
pub fn format_watermark(watermark: Option<u64>) -> String {
    match watermark {
        Some(ms) => format!("{ms} ms since epoch"),
        None => "never synced".to_string(),
    }
}
