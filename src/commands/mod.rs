//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod render;
pub mod trace;
pub mod utils;

// Re-export main command functions
pub use models::{DiagramOptions, RenderArgs, SelectionOptions, TraceArgs};
pub use render::{execute_render, validate_render_args};
pub use trace::{execute_trace, validate_trace_args};
pub use utils::{display_formats, display_version, validate_snapshot_file};
