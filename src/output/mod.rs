//! Output for traced activation lists.
//!
//! This module handles:
//! - JSON snapshots (save a run, render it later)
//! - Diagram formatters (text and JSON) behind a registry

pub mod formatter;
pub mod snapshot;

// Re-export main types and functions
pub use formatter::{Diagram, Formatter, FormatterRegistry, JsonFormatter, TextFormatter};
pub use snapshot::{
    read_snapshot, read_snapshot_file, write_snapshot, write_snapshot_to, Snapshot, SnapshotNode,
};
