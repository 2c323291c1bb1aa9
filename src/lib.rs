//! seqtrace
//!
//! Call tree reconstruction from execution event streams, and the
//! transformations that turn those trees into sequence diagrams.
//!
//! This crate provides the core implementation for the
//! `seqtrace` CLI tool.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install seqtrace
//! seqtrace trace --events run.jsonl --start com.acme.App.run
//! ```
//!
//! Library users drive a [`tracer::Dispatcher`] from an
//! [`tracer::EventSource`], then pass the resulting activation list through
//! [`transform::prepare_for_diagram`] and a formatter from
//! [`output::FormatterRegistry`].

pub mod commands;
pub mod model;
pub mod output;
pub mod pattern;
pub mod tracer;
pub mod transform;
pub mod utils;
