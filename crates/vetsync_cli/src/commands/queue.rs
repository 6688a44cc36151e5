//! Queue command implementation.

use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One queued operation, as displayed.
#[derive(Debug, Serialize)]
pub struct OperationRow {
    /// Operation id.
    pub id: String,
    /// Entity type wire name.
    pub entity_type: String,
    /// Target entity id.
    pub entity_id: String,
    /// Operation kind.
    pub kind: String,
    /// Current status.
    pub status: String,
    /// Dispatch attempts so far.
    pub attempts: u32,
    /// Enqueue time, ms since epoch.
    pub enqueued_at: u64,
    /// Last failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Runs the queue command.
pub fn run(
    path: &Path,
    tenant: &str,
    pending_only: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Listing sync queue for tenant {tenant} in {:?}", path);
    let store = super::open_store(path)?;
    let handle = store.tenant(&super::cli_context(tenant)?)?;

    let operations = if pending_only {
        handle.pending_operations()
    } else {
        handle.operations()
    };

    let rows: Vec<OperationRow> = operations
        .iter()
        .map(|op| OperationRow {
            id: op.id.to_string(),
            entity_type: op.entity_type.as_str().to_string(),
            entity_id: op.entity_id.clone(),
            kind: format!("{:?}", op.kind).to_lowercase(),
            status: format!("{:?}", op.status).to_lowercase(),
            attempts: op.attempts,
            enqueued_at: op.enqueued_at_ms,
            last_error: op.last_error.clone(),
        })
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => {
            println!(
                "Sync queue for tenant {} ({} operation{})",
                tenant,
                rows.len(),
                if rows.len() == 1 { "" } else { "s" }
            );
            for row in &rows {
                println!();
                println!("  {} {} {} ({})", row.kind, row.entity_type, row.entity_id, row.id);
                println!("    status: {}, attempts: {}", row.status, row.attempts);
                if let Some(err) = &row.last_error {
                    println!("    last error: {err}");
                }
            }
        }
    }
    Ok(())
}
