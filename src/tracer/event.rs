//! Execution events delivered by an event source.
//!
//! Events are serialized with a `kind` tag so a recorded stream reads as
//! one JSON object per event:
//!
//! ```json
//! {"kind": "method_entry", "thread": 1, "owner": "com.acme.Bank", "member": {"name": "withdraw"}, "frame_depth": 3}
//! ```

use crate::model::MemberRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an observed thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

/// One execution event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    /// The traced program started
    ProgramStart,

    /// A type became available, with the members it declares
    ClassPrepared {
        thread: ThreadId,
        owner: String,
        #[serde(default)]
        members: Vec<MemberRef>,
    },

    MethodEntry {
        thread: ThreadId,
        owner: String,
        member: MemberRef,
        frame_depth: i32,
    },

    MethodExit {
        thread: ThreadId,
        owner: String,
        member: MemberRef,
    },

    /// An exception was thrown in `owner`
    Exception { thread: ThreadId, owner: String },

    /// A single step completed after an exception
    Step { thread: ThreadId, frame_depth: i32 },

    Breakpoint {
        thread: ThreadId,
        owner: String,
        member: MemberRef,
        frame_depth: i32,
    },

    ThreadDeath { thread: ThreadId },

    /// The traced program exited
    ProgramDeath,

    /// The connection to the traced program closed
    Disconnect,
}

impl TraceEvent {
    /// Thread the event belongs to, if any
    pub fn thread(&self) -> Option<ThreadId> {
        match self {
            TraceEvent::ClassPrepared { thread, .. }
            | TraceEvent::MethodEntry { thread, .. }
            | TraceEvent::MethodExit { thread, .. }
            | TraceEvent::Exception { thread, .. }
            | TraceEvent::Step { thread, .. }
            | TraceEvent::Breakpoint { thread, .. }
            | TraceEvent::ThreadDeath { thread } => Some(*thread),
            TraceEvent::ProgramStart | TraceEvent::ProgramDeath | TraceEvent::Disconnect => None,
        }
    }

    /// Process lifecycle events are always delivered, even in drain mode
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            TraceEvent::ProgramStart | TraceEvent::ProgramDeath | TraceEvent::Disconnect
        )
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            TraceEvent::ProgramStart => "program_start",
            TraceEvent::ClassPrepared { .. } => "class_prepared",
            TraceEvent::MethodEntry { .. } => "method_entry",
            TraceEvent::MethodExit { .. } => "method_exit",
            TraceEvent::Exception { .. } => "exception",
            TraceEvent::Step { .. } => "step",
            TraceEvent::Breakpoint { .. } => "breakpoint",
            TraceEvent::ThreadDeath { .. } => "thread_death",
            TraceEvent::ProgramDeath => "program_death",
            TraceEvent::Disconnect => "disconnect",
        }
    }
}

/// Events produced between two suspend points, in execution order
pub type EventBatch = Vec<TraceEvent>;
