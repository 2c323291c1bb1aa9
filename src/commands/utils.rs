use crate::output::{read_snapshot_file, FormatterRegistry};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a snapshot file
pub fn validate_snapshot_file(file_path: &Path) -> Result<()> {
    println!("Validating snapshot: {}", file_path.display());

    let activations = read_snapshot_file(file_path)
        .with_context(|| format!("Invalid snapshot {}", file_path.display()))?;

    println!("✓ Valid snapshot JSON");
    println!("  Root activations: {}", activations.len());
    println!("  Activations: {}", activations.node_count());

    Ok(())
}

/// List registered diagram formats
pub fn display_formats(registry: &FormatterRegistry) {
    println!("Available formats:");
    for (name, description) in registry.descriptions() {
        println!("  {:<8} {}", name, description);
    }
}

/// Display version information
pub fn display_version() {
    println!("seqtrace v{}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Reconstructs call trees from execution events and renders sequence diagrams.");
}
