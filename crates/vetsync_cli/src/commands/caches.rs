//! Caches command implementation.

use std::path::Path;
use tracing::info;
use vetsync_cache::CacheStorage;

/// Runs the caches command: lists namespace files, optionally clearing
/// them all first.
pub fn run(dir: &Path, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("Scanning cache namespaces under {:?}", dir);
    let storage = CacheStorage::open(dir)?;

    if clear {
        let removed = storage.clear_all()?;
        println!("cleared {removed} namespace file{}", if removed == 1 { "" } else { "s" });
        return Ok(());
    }

    let names = storage.list()?;
    if names.is_empty() {
        println!("no cache namespaces under {}", dir.display());
        return Ok(());
    }

    println!("Cache namespaces under {}:", dir.display());
    for name in names {
        println!("  {} (kind: {}, version: {})", name.render(), name.kind, name.token);
    }
    Ok(())
}
