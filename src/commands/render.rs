//! Render command implementation.
//!
//! The render command:
//! 1. Reads a snapshot
//! 2. Resolves the configuration
//! 3. Prepares the activation list
//! 4. Writes the diagram

use super::models::{DiagramOptions, RenderArgs};
use crate::model::{ActivationList, ColumnMap};
use crate::output::{read_snapshot_file, FormatterRegistry};
use crate::transform::prepare_for_diagram;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

/// Execute the render command
///
/// **Public** - main entry point called from main.rs
pub fn execute_render(args: RenderArgs, registry: &FormatterRegistry) -> Result<()> {
    info!("Rendering snapshot: {}", args.snapshot.display());

    info!("Step 1/3: Reading snapshot...");
    let activations = read_snapshot_file(&args.snapshot)
        .with_context(|| format!("Failed to read snapshot {}", args.snapshot.display()))?;

    info!("Step 2/3: Preparing activations...");
    let config = args.selection.resolve()?;
    let settings = config.validate().context("Invalid trace configuration")?;
    let hierarchy = Arc::new(settings.hierarchy.clone());
    let prepared = prepare_for_diagram(&activations, &settings, hierarchy);

    info!("Step 3/3: Writing diagram...");
    emit_diagram(&prepared, &args.diagram, registry)?;

    if args.diagram.summary {
        print_summary(&prepared, &[]);
    }
    Ok(())
}

/// Format a prepared list and send it to the file or stdout
///
/// **Public** - shared by the trace and render commands
pub fn emit_diagram(
    activations: &ActivationList,
    options: &DiagramOptions,
    registry: &FormatterRegistry,
) -> Result<()> {
    let formatter = registry.get(&options.format)?;
    let diagram = formatter
        .format(activations)
        .with_context(|| format!("Failed to render {} diagram", options.format))?;

    match &options.out {
        Some(path) => {
            diagram
                .save(path)
                .with_context(|| format!("Failed to write diagram {}", path.display()))?;
            info!("✓ Diagram written to: {}", path.display());
        }
        None if !options.quiet => print!("{}", diagram),
        None => {}
    }
    Ok(())
}

/// Print a short summary of a prepared list, plus extra `(label, value)` lines
pub fn print_summary(activations: &ActivationList, extra: &[(&str, String)]) {
    let columns = ColumnMap::from_activations(activations);

    println!("\n{}", "=".repeat(80));
    println!("TRACE SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Root activations: {}", activations.len());
    println!("Activations:      {}", activations.node_count());
    for (label, value) in extra {
        println!("{:<18}{}", format!("{}:", label), value);
    }
    println!("Participants:");
    for participant in columns.participants() {
        println!("  {:>3}  {}", participant.column, participant.name);
    }
    println!("{}", "=".repeat(80));
}

/// Validate render arguments
pub fn validate_render_args(args: &RenderArgs) -> Result<()> {
    if args.snapshot.as_os_str().is_empty() {
        anyhow::bail!("Snapshot path cannot be empty");
    }
    if !args.snapshot.is_file() {
        anyhow::bail!("Snapshot file not found: {}", args.snapshot.display());
    }
    if args.diagram.format.is_empty() {
        anyhow::bail!("Format cannot be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberRef;
    use crate::output::write_snapshot;
    use tempfile::tempdir;

    #[test]
    fn test_validate_render_args_missing_snapshot() {
        let args = RenderArgs {
            snapshot: "/nonexistent/run.json".into(),
            ..Default::default()
        };
        assert!(validate_render_args(&args).is_err());
    }

    #[test]
    fn test_render_writes_diagram() {
        let dir = tempdir().unwrap();
        let snapshot = dir.path().join("run.json");
        let out = dir.path().join("out/diagram.txt");

        let mut list = ActivationList::new();
        let root = list.add_root("App", MemberRef::new("main"));
        list.add_child(root, "java.util.List", MemberRef::new("add"));
        list.add_child(root, "App", MemberRef::new("work"));
        write_snapshot(&list, &snapshot).unwrap();

        let args = RenderArgs {
            snapshot,
            diagram: DiagramOptions {
                out: Some(out.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        validate_render_args(&args).unwrap();
        execute_render(args, &FormatterRegistry::with_defaults()).unwrap();

        let written = std::fs::read_to_string(out).unwrap();
        assert_eq!(written, "App.main\n    App.work\n");
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let list = ActivationList::new();
        let options = DiagramOptions {
            format: "svg".to_string(),
            ..Default::default()
        };
        assert!(emit_diagram(&list, &options, &FormatterRegistry::with_defaults()).is_err());
    }
}
