//! Live event requests.
//!
//! The dispatcher owns one [`Subscriptions`] value describing which events
//! it currently wants. Events that the subscriptions do not admit are
//! dropped before they reach a thread state; a live source may also use it
//! to stop producing them.

use super::event::{ThreadId, TraceEvent};
use crate::model::MemberRef;
use crate::pattern::PatternSet;
use std::collections::HashSet;

/// Owner filter for method entry, exit and exception events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    pub includes: PatternSet,
    pub excludes: PatternSet,
}

impl ClassFilter {
    pub fn new(includes: PatternSet, excludes: PatternSet) -> Self {
        Self { includes, excludes }
    }

    /// Admitted when any include matches (or there are none) and no exclude does
    pub fn admits(&self, owner: &str) -> bool {
        (self.includes.is_empty() || self.includes.matches_any(owner))
            && !self.excludes.matches_any(owner)
    }
}

/// A breakpoint armed on one member of one owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub owner: String,
    pub member: MemberRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    /// Entry, exit and exception events for admitted owners
    pub method_events: Option<ClassFilter>,

    /// Exit events for this owner only, used while a boundary call runs
    pub scoped_exit: Option<String>,

    /// Owner whose "class prepared" notification is wanted
    pub class_prepare: Option<String>,

    pub breakpoints: Vec<Breakpoint>,

    /// Threads with a single step armed
    pub single_steps: HashSet<ThreadId>,

    pub thread_death: bool,
}

impl Subscriptions {
    /// Nothing subscribed
    pub fn none() -> Self {
        Self::default()
    }

    /// Wait for `owner` to become available
    pub fn awaiting_class(owner: impl Into<String>) -> Self {
        Self {
            class_prepare: Some(owner.into()),
            ..Self::default()
        }
    }

    /// Check whether an event would be delivered
    pub fn delivers(&self, event: &TraceEvent) -> bool {
        match event {
            TraceEvent::ProgramStart | TraceEvent::ProgramDeath | TraceEvent::Disconnect => true,
            TraceEvent::ClassPrepared { owner, .. } => {
                self.class_prepare.as_deref() == Some(owner.as_str())
            }
            TraceEvent::MethodEntry { owner, .. } | TraceEvent::Exception { owner, .. } => {
                self.admits_method_event(owner)
            }
            TraceEvent::MethodExit { owner, .. } => {
                self.admits_method_event(owner)
                    || self.scoped_exit.as_deref() == Some(owner.as_str())
            }
            TraceEvent::Step { thread, .. } => self.single_steps.contains(thread),
            TraceEvent::Breakpoint { owner, .. } => {
                self.breakpoints.iter().any(|b| &b.owner == owner)
            }
            TraceEvent::ThreadDeath { .. } => self.thread_death,
        }
    }

    fn admits_method_event(&self, owner: &str) -> bool {
        self.method_events
            .as_ref()
            .map_or(false, |filter| filter.admits(owner))
    }

    /// Subscribe to every method event admitted by `filter`
    pub fn enable_method_tracing(&mut self, filter: ClassFilter) {
        self.clear_tracing();
        self.method_events = Some(filter);
        self.thread_death = true;
    }

    /// Only exits of `owner` until the boundary call returns
    pub fn suppress_for(&mut self, owner: impl Into<String>) {
        self.clear_tracing();
        self.scoped_exit = Some(owner.into());
    }

    /// Drop every tracing request; thread death and armed steps stay
    pub fn clear_tracing(&mut self) {
        self.method_events = None;
        self.scoped_exit = None;
        self.class_prepare = None;
        self.breakpoints.clear();
    }

    pub fn arm_step(&mut self, thread: ThreadId) {
        self.single_steps.insert(thread);
    }

    /// Consume the armed step of `thread`, if any
    pub fn take_step(&mut self, thread: ThreadId) -> bool {
        self.single_steps.remove(&thread)
    }

    pub fn is_tracing(&self) -> bool {
        self.method_events.is_some() || self.scoped_exit.is_some()
    }
}
