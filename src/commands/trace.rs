//! Trace command implementation.
//!
//! The trace command:
//! 1. Resolves and validates the configuration
//! 2. Opens the recorded event stream
//! 3. Dispatches events into an activation list
//! 4. Saves a snapshot (if requested)
//! 5. Prepares the activation list for rendering
//! 6. Writes the diagram

use super::models::TraceArgs;
use super::render::{emit_diagram, print_summary};
use crate::output::{write_snapshot, FormatterRegistry};
use crate::tracer::{Dispatcher, RecordedEventSource, TraceOutcome};
use crate::transform::prepare_for_diagram;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Execute the trace command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Invalid configuration
/// * Unreadable event recording
/// * Fatal tracing errors (start method not found, unexpected breakpoint)
/// * Snapshot or diagram write errors
pub fn execute_trace(args: TraceArgs, registry: &FormatterRegistry) -> Result<TraceOutcome> {
    let start_time = Instant::now();

    info!("Starting trace of recording: {}", args.events.display());

    info!("Step 1/6: Resolving configuration...");
    let config = args.selection.resolve()?;
    let settings = config.validate().context("Invalid trace configuration")?;
    // Fail on an unknown format before doing any work
    registry.get(&args.diagram.format)?;

    info!("Step 2/6: Opening event recording...");
    let mut source = RecordedEventSource::from_path(&args.events)
        .with_context(|| format!("Failed to open event recording {}", args.events.display()))?;

    info!("Step 3/6: Dispatching events...");
    let outcome = Dispatcher::new(&settings)
        .run(&mut source)
        .context("Tracing failed")?;

    debug!("Trace statistics: {:?}", outcome.stats);
    if source.skipped_lines() > 0 {
        warn!("Skipped {} malformed event lines", source.skipped_lines());
    }
    if outcome.stats.mismatched_exits > 0 {
        info!("Ignored {} mismatched exit events", outcome.stats.mismatched_exits);
    }

    if let Some(path) = &args.save {
        info!("Step 4/6: Saving snapshot...");
        write_snapshot(&outcome.activations, path).context("Failed to write snapshot")?;
        info!("✓ Snapshot written to: {}", path.display());
    } else {
        info!("Step 4/6: Skipping snapshot (not requested)");
    }

    info!("Step 5/6: Preparing activations...");
    let prepared = prepare_for_diagram(
        &outcome.activations,
        &settings,
        Arc::new(settings.hierarchy.clone()),
    );

    info!("Step 6/6: Writing diagram...");
    emit_diagram(&prepared, &args.diagram, registry)?;

    if args.diagram.summary {
        print_summary(
            &prepared,
            &[
                ("Termination", format!("{:?}", outcome.termination)),
                ("Events", outcome.stats.events.to_string()),
                ("Threads", outcome.stats.threads.to_string()),
                ("Mismatched exits", outcome.stats.mismatched_exits.to_string()),
            ],
        );
    }

    let elapsed = start_time.elapsed();
    info!("Trace completed in {:.2}s", elapsed.as_secs_f64());

    Ok(outcome)
}

/// Validate trace arguments
///
/// **Public** - can be called before execute_trace for early validation
pub fn validate_trace_args(args: &TraceArgs) -> Result<()> {
    if args.events.as_os_str().is_empty() {
        anyhow::bail!("Event recording path cannot be empty");
    }

    if !args.events.is_file() {
        anyhow::bail!("Event recording not found: {}", args.events.display());
    }

    if let Some(save) = &args.save {
        if save.is_dir() {
            anyhow::bail!("Snapshot path is a directory: {}", save.display());
        }
    }

    if args.diagram.format.is_empty() {
        anyhow::bail!("Format cannot be empty");
    }

    Ok(())
}
