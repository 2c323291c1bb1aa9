use crate::tracer::{load_config, TraceConfig};
use crate::utils::config::DEFAULT_FORMAT;
use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

/// Trace selection options shared by `trace` and `render`
///
/// Values given here are appended to (lists) or override (scalars) the
/// configuration file.
#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    /// TOML configuration file
    pub config: Option<PathBuf>,

    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub boundary: Vec<String>,
    pub public_only: bool,

    /// Fully-qualified start method
    pub start: Option<String>,

    /// Do not append the standard library excludes
    pub no_std_excludes: bool,
}

impl SelectionOptions {
    /// Load the configuration file, if any, and layer these options on top
    pub fn resolve(&self) -> Result<TraceConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => TraceConfig::default(),
        };

        config.include.extend(self.include.iter().cloned());
        config.exclude.extend(self.exclude.iter().cloned());
        config.boundary_methods.extend(self.boundary.iter().cloned());
        config.public_only |= self.public_only;
        if self.start.is_some() {
            config.start_method = self.start.clone();
        }
        if self.no_std_excludes {
            config.std_excludes = false;
        }

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

/// Where and how the diagram is written
#[derive(Debug, Clone)]
pub struct DiagramOptions {
    /// Registered formatter name
    pub format: String,

    /// Write the diagram here instead of stdout
    pub out: Option<PathBuf>,

    /// Do not print the diagram to stdout
    pub quiet: bool,

    /// Print a text summary to stdout
    pub summary: bool,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            out: None,
            quiet: false,
            summary: false,
        }
    }
}

/// Arguments for the trace command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct TraceArgs {
    /// Recorded event stream (JSON lines)
    pub events: PathBuf,

    /// Save the raw activation list as a snapshot
    pub save: Option<PathBuf>,

    pub selection: SelectionOptions,
    pub diagram: DiagramOptions,
}

/// Arguments for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderArgs {
    /// Snapshot written by an earlier `trace --save`
    pub snapshot: PathBuf,

    pub selection: SelectionOptions,
    pub diagram: DiagramOptions,
}
