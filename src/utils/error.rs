//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while validating configuration, before any tracing starts
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Not a qualified method name: \"{0}\"")]
    NotQualified(String),

    #[error("Unsupported pattern \"{0}\": '*' is only allowed as the first or last character")]
    UnsupportedPattern(String),

    #[error("Unknown output format \"{name}\". Should be one of {available}")]
    UnknownFormat { name: String, available: String },

    #[error("Failed to read configuration: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// Errors produced by an event source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Connection to the traced program was lost")]
    Disconnected,

    #[error("Failed to read events: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors while tracing
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Start method not found: {0}")]
    StartMethodNotFound(String),

    #[error("Unexpected breakpoint. Should be in method {expected}, but was in method {actual}")]
    UnexpectedBreakpoint { expected: String, actual: String },

    #[error("Event source failed: {0}")]
    Source(#[from] SourceError),
}

/// Errors that can occur while saving or loading snapshots
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot path: {0}")]
    InvalidPath(String),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

/// Errors that can occur while rendering a diagram
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Failed to serialize diagram: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
