//! Call trace reconstruction from execution events.
//!
//! This module handles:
//! - Loading and validating the trace configuration
//! - Reading events from recorded or in-memory sources
//! - Dispatching events to per-thread state machines
//! - Building the activation list

pub mod config;
pub mod dispatcher;
pub mod event;
pub mod source;
pub mod subscriptions;
pub mod thread_trace;

pub use config::{load_config, TraceConfig, TraceSettings};
pub use dispatcher::{Dispatcher, Termination, TraceOutcome, TraceStats, TracingMode};
pub use event::{EventBatch, ThreadId, TraceEvent};
pub use source::{EventSource, MemoryEventSource, RecordedEventSource};
pub use subscriptions::{Breakpoint, ClassFilter, Subscriptions};
pub use thread_trace::{Directive, ThreadState, ThreadTrace};
