//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use tracing::info;
use vetsync_protocol::EntityType;

/// Inspection result for one tenant.
#[derive(Debug, Serialize)]
pub struct TenantReport {
    /// The tenant id.
    pub tenant_id: String,
    /// Live record count per entity type (empty types omitted).
    pub records: Vec<TypeCount>,
    /// Total live records.
    pub total_records: usize,
    /// Queued operations (all statuses).
    pub operations: usize,
    /// Operations still pending.
    pub pending: usize,
    /// The last successful pull watermark, ms since epoch.
    pub last_sync_timestamp: Option<u64>,
}

/// Record count for one entity type.
#[derive(Debug, Serialize)]
pub struct TypeCount {
    /// The entity type's wire name.
    pub entity_type: String,
    /// Live records of that type.
    pub count: usize,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    tenant: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Inspecting store at {:?}", path);
    let store = super::open_store(path)?;

    let tenant_ids = match tenant {
        Some(id) => vec![id.to_string()],
        None => store.list_tenants()?,
    };
    if tenant_ids.is_empty() {
        return Err(format!("no tenants found under {}", path.display()).into());
    }

    let mut reports = Vec::new();
    for tenant_id in &tenant_ids {
        let handle = store.tenant(&super::cli_context(tenant_id)?)?;

        let mut records = Vec::new();
        let mut total = 0;
        for entity_type in EntityType::ALL {
            let count = handle.count(entity_type);
            if count > 0 {
                records.push(TypeCount {
                    entity_type: entity_type.as_str().to_string(),
                    count,
                });
                total += count;
            }
        }

        reports.push(TenantReport {
            tenant_id: tenant_id.clone(),
            records,
            total_records: total,
            operations: handle.operations().len(),
            pending: handle.pending_count(),
            last_sync_timestamp: handle.last_sync_timestamp(),
        });
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => print_text_output(path, &reports),
    }
    Ok(())
}

fn print_text_output(path: &Path, reports: &[TenantReport]) {
    println!("VetSync Store Inspection");
    println!("========================");
    println!();
    println!("Path: {}", path.display());

    for report in reports {
        println!();
        println!("Tenant: {}", report.tenant_id);
        println!("  Watermark:  {}", super::format_watermark(report.last_sync_timestamp));
        println!(
            "  Operations: {} total, {} pending",
            report.operations, report.pending
        );
        println!("  Records:    {} total", report.total_records);
        for tc in &report.records {
            println!("    {:<16} {}", tc.entity_type, tc.count);
        }
    }
}
