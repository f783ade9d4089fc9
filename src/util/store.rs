//! Writes the declaration set out as one file per resource, at the path
//! given by its address. This tree is the hand-off surface for the engine;
//! nothing here reads remote state.

use std::{fs, path::Path};

use anyhow::Context;
use walkdir::WalkDir;

use crate::{
    addr::{ResourceAddress, SnowflakeResourceAddress},
    registry::DeclarationRegistry,
    resource::SnowflakeResource,
};

/// Write every registered declaration under `prefix`.
pub fn write_tree(registry: &DeclarationRegistry, prefix: &Path) -> Result<(), anyhow::Error> {
    for (identifier, entry) in registry.entries() {
        let path = prefix.join(entry.addr.to_path_buf());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, entry.resource.to_bytes()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("wrote declaration `{}` to {}", identifier, path.display());
    }
    Ok(())
}

/// List the declaration addresses present under `prefix`. Files that are not
/// declaration paths are skipped.
pub fn list_tree(prefix: &Path) -> Result<Vec<SnowflakeResourceAddress>, anyhow::Error> {
    let mut results = Vec::new();
    for entry in WalkDir::new(prefix) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(prefix)?;
        if let Ok(addr) = SnowflakeResourceAddress::from_path(rel) {
            results.push(addr);
        }
    }
    Ok(results)
}

/// Load and decode the declaration stored at `addr` under `prefix`.
pub fn read_resource(prefix: &Path, addr: &SnowflakeResourceAddress) -> Result<SnowflakeResource, anyhow::Error> {
    let path = prefix.join(addr.to_path_buf());
    let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    SnowflakeResource::from_bytes(addr, &bytes)
}
