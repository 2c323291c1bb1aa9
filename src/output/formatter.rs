//! Diagram formatters and the registry that names them.
//!
//! A formatter turns a prepared activation list into a [`Diagram`]. The
//! registry is an ordinary value built by the caller; commands receive it
//! rather than reaching for a global.

use crate::model::{ActivationId, ActivationList, ColumnMap, Participant};
use crate::utils::error::{ConfigError, FormatError, OutputError};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders an activation list
pub trait Formatter {
    fn format(&self, activations: &ActivationList) -> Result<Diagram, FormatError>;

    /// One-line description shown by `seqtrace formats`
    fn description(&self) -> &str;
}

/// Rendered diagram text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    content: String,
}

impl Diagram {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Write the diagram to a file, creating parent directories
    ///
    /// # Errors
    /// * `OutputError::InvalidPath` - empty path, directory, or uncreatable parent
    /// * `OutputError::WriteFailed` - I/O error during write
    pub fn save(&self, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
        let output_path = output_path.as_ref();

        info!("Writing diagram to: {}", output_path.display());

        if output_path.as_os_str().is_empty() {
            return Err(OutputError::InvalidPath("Path is empty".to_string()));
        }
        if output_path.is_dir() {
            return Err(OutputError::InvalidPath(format!(
                "Path is a directory: {}",
                output_path.display()
            )));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directories: {}", parent.display());
                std::fs::create_dir_all(parent).map_err(|e| {
                    OutputError::InvalidPath(format!("Cannot create directory: {}", e))
                })?;
            }
        }

        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.content.as_bytes())?;
        writer.flush()?;

        info!("Diagram written successfully ({} bytes)", self.content.len());
        Ok(())
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Named formatters
pub struct FormatterRegistry {
    formatters: BTreeMap<String, Box<dyn Formatter>>,
}

impl FormatterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            formatters: BTreeMap::new(),
        }
    }

    /// Registry with the built-in `text` and `json` formatters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("text", Box::new(TextFormatter));
        registry.register("json", Box::new(JsonFormatter));
        registry
    }

    /// Add a formatter, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, formatter: Box<dyn Formatter>) {
        self.formatters.insert(name.into(), formatter);
    }

    /// Look a formatter up by name
    ///
    /// # Errors
    /// * `ConfigError::UnknownFormat` - lists the registered names
    pub fn get(&self, name: &str) -> Result<&dyn Formatter, ConfigError> {
        self.formatters
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ConfigError::UnknownFormat {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.formatters.keys().map(String::as_str).collect()
    }

    /// `(name, description)` pairs, sorted by name
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        self.formatters
            .iter()
            .map(|(name, f)| (name.as_str(), f.description()))
            .collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Indented call tree
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, activations: &ActivationList) -> Result<Diagram, FormatError> {
        Ok(Diagram::new(activations.to_string()))
    }

    fn description(&self) -> &str {
        "Indented call tree, one call per line"
    }
}

/// Participants and messages as JSON, for external diagram renderers
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct SequenceDocument {
    participants: Vec<Participant>,
    messages: Vec<Message>,
}

/// One call arrow
#[derive(Debug, Serialize)]
struct Message {
    /// Caller column, `None` for calls entering from outside
    from: Option<usize>,
    to: usize,
    label: String,
    repetitions: u32,
    /// Nesting level, 0 for roots
    level: usize,
}

impl Formatter for JsonFormatter {
    fn format(&self, activations: &ActivationList) -> Result<Diagram, FormatError> {
        let columns = ColumnMap::from_activations(activations);
        let mut messages = Vec::with_capacity(activations.node_count());

        let mut stack: Vec<(ActivationId, usize)> = activations
            .root_ids()
            .iter()
            .rev()
            .map(|&id| (id, 0))
            .collect();
        while let Some((id, level)) = stack.pop() {
            let activation = activations.get(id);
            let column = |owner: &str| columns.column(owner).unwrap_or_default();
            messages.push(Message {
                from: activation.parent().map(|p| column(p.owner())),
                to: column(activation.owner()),
                label: activation.member().name.clone(),
                repetitions: activation.repetitions(),
                level,
            });
            let children: Vec<_> = activation.children().map(|c| (c.id(), level + 1)).collect();
            stack.extend(children.into_iter().rev());
        }

        let document = SequenceDocument {
            participants: columns.participants(),
            messages,
        };
        Ok(Diagram::new(serde_json::to_string_pretty(&document)?))
    }

    fn description(&self) -> &str {
        "Participants and call messages as JSON"
    }
}
