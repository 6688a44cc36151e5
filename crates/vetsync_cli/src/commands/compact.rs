//! Compact command implementation.

use std::path::Path;
use tracing::info;

/// Runs the compact command.
///
/// Compacts one tenant's log, or every tenant's when none is named.
pub fn run(path: &Path, tenant: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Compacting tenant logs under {:?}", path);
    let store = super::open_store(path)?;

    let tenant_ids = match tenant {
        Some(id) => vec![id.to_string()],
        None => store.list_tenants()?,
    };
    if tenant_ids.is_empty() {
        return Err(format!("no tenants found under {}", path.display()).into());
    }

    let mut total_reclaimed = 0;
    for tenant_id in &tenant_ids {
        let handle = store.tenant(&super::cli_context(tenant_id)?)?;
        let reclaimed = handle.compact()?;
        total_reclaimed += reclaimed;
        println!("{tenant_id}: reclaimed {reclaimed} bytes");
    }

    if tenant_ids.len() > 1 {
        println!("total: reclaimed {total_reclaimed} bytes");
    }
    Ok(())
}
