//! Per-thread call stack reconstruction.
//!
//! A [`ThreadTrace`] tracks the innermost open activation of one thread and
//! grows the shared activation list as events arrive. It never touches the
//! subscriptions itself; instead it returns [`Directive`]s that the
//! dispatcher applies.

use super::config::TraceSettings;
use super::event::ThreadId;
use crate::model::{ActivationId, ActivationList, MemberRef, QualifiedMethod};
use crate::utils::error::TraceError;
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Tracing,
    /// Inside a boundary method; callees are not traced
    BoundarySuppressed,
    /// An exception was thrown; waiting for the step that finds the handler
    Unwinding,
    Finished,
}

/// Subscription change requested by a thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Only deliver exits of `owner` until the boundary call returns
    SuppressFor { owner: String },
    RestoreTracing,
    /// The start method returned; stop tracing for good
    StopTracing,
    /// Switch from deferred start to full tracing
    StartTracing,
    ArmStep,
}

#[derive(Debug, Clone)]
pub struct ThreadTrace {
    thread: ThreadId,
    state: ThreadState,
    current: Option<ActivationId>,
    boundary_method: Option<String>,
    stop_when_done: bool,
    mismatched_exits: usize,
}

impl ThreadTrace {
    pub fn new(thread: ThreadId) -> Self {
        debug!("====== {} ======", thread);
        Self {
            thread,
            state: ThreadState::Tracing,
            current: None,
            boundary_method: None,
            stop_when_done: false,
            mismatched_exits: 0,
        }
    }

    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Innermost open activation
    pub fn current(&self) -> Option<ActivationId> {
        self.current
    }

    pub fn mismatched_exits(&self) -> usize {
        self.mismatched_exits
    }

    pub fn is_finished(&self) -> bool {
        self.state == ThreadState::Finished
    }

    /// Handle a method entry
    ///
    /// The boundary check runs first, so a boundary method is itself
    /// recorded unless the public-only policy skips it.
    pub fn method_entry(
        &mut self,
        activations: &mut ActivationList,
        settings: &TraceSettings,
        owner: &str,
        member: &MemberRef,
        frame_depth: i32,
    ) -> Vec<Directive> {
        let mut directives = Vec::new();
        let qualified_name = format!("{}.{}", owner, member.name);

        if settings.is_boundary_method(&qualified_name) {
            debug!("{} entered boundary method {}", self.thread, qualified_name);
            self.state = ThreadState::BoundarySuppressed;
            self.boundary_method = Some(qualified_name);
            directives.push(Directive::SuppressFor {
                owner: owner.to_string(),
            });
        }

        if settings.public_only && !member.public {
            trace!("{} skipping non-public {}.{}", self.thread, owner, member.name);
            return directives;
        }

        self.enter(activations, owner, member, frame_depth);
        directives
    }

    fn enter(
        &mut self,
        activations: &mut ActivationList,
        owner: &str,
        member: &MemberRef,
        frame_depth: i32,
    ) {
        trace!("{} -> {}.{} {:?}", self.thread, owner, member.name, member.arg_types);
        let id = activations.add(self.current, owner, member.clone(), frame_depth);
        self.current = Some(id);
    }

    /// Handle a method exit
    ///
    /// A mismatched exit leaves the stack alone and is only counted. The
    /// boundary exit restores tracing even when the boundary call itself
    /// was never recorded.
    pub fn method_exit(
        &mut self,
        activations: &ActivationList,
        owner: &str,
        member: &MemberRef,
    ) -> Vec<Directive> {
        let mut directives = Vec::new();

        if let Some(current) = self.current {
            let open = activations.get(current);
            if open.owner() == owner && open.member().name == member.name {
                trace!("{} <- {}.{}", self.thread, owner, member.name);
                self.current = activations.parent_id(current);
            } else {
                self.mismatched_exits += 1;
                debug!(
                    "{} mismatched exit {}.{} while in {}",
                    self.thread,
                    owner,
                    member.name,
                    open.qualified_name()
                );
            }

            if self.current.is_none() && self.stop_when_done {
                directives.push(Directive::StopTracing);
            }
        }

        let qualified_name = format!("{}.{}", owner, member.name);
        if self.boundary_method.as_deref() == Some(qualified_name.as_str()) {
            debug!("{} left boundary method {}", self.thread, qualified_name);
            self.boundary_method = None;
            self.state = ThreadState::Tracing;
            directives.push(Directive::RestoreTracing);
        }
        directives
    }

    pub fn exception(&mut self) -> Directive {
        self.state = ThreadState::Unwinding;
        Directive::ArmStep
    }

    /// Pop back to the activation whose frame the step landed in
    pub fn step(&mut self, activations: &ActivationList, frame_depth: i32) {
        while let Some(current) = self.current {
            let Some(parent) = activations.parent_id(current) else {
                break;
            };
            if activations.get(current).stack_depth() == frame_depth {
                break;
            }
            self.current = Some(parent);
        }
        self.state = ThreadState::Tracing;
    }

    /// Start method breakpoint: record it like an entry and begin tracing
    ///
    /// # Errors
    /// * `TraceError::UnexpectedBreakpoint` - breakpoint hit in another method
    pub fn breakpoint(
        &mut self,
        activations: &mut ActivationList,
        start: &QualifiedMethod,
        owner: &str,
        member: &MemberRef,
        frame_depth: i32,
    ) -> Result<Directive, TraceError> {
        if member.name != start.member {
            return Err(TraceError::UnexpectedBreakpoint {
                expected: start.member.clone(),
                actual: member.name.clone(),
            });
        }
        debug!("{} reached start method {}", self.thread, start);
        self.enter(activations, owner, member, frame_depth);
        self.stop_when_done = true;
        Ok(Directive::StartTracing)
    }

    pub fn thread_death(&mut self) {
        debug!("====== {} end ======", self.thread);
        self.state = ThreadState::Finished;
    }
}
