//! Event dispatcher: routes batches to per-thread state machines.
//!
//! One dispatcher runs one trace. It owns the activation list under
//! construction and hands it over in a [`TraceOutcome`] when the event
//! stream ends.

use super::config::TraceSettings;
use super::event::{EventBatch, ThreadId, TraceEvent};
use super::source::EventSource;
use super::subscriptions::{Breakpoint, ClassFilter, Subscriptions};
use super::thread_trace::{Directive, ThreadTrace};
use crate::model::{ActivationList, MemberRef};
use crate::utils::error::{SourceError, TraceError};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Global tracing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingMode {
    /// Waiting for the start method to be reached
    AwaitingStart,
    Tracing,
    /// The start method returned; nothing more is recorded
    Stopped,
}

/// How the event stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    ProgramExited,
    LinkLost,
}

/// Counters collected while dispatching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceStats {
    pub batches: usize,
    pub events: usize,
    /// Events not admitted by the live subscriptions
    pub filtered_events: usize,
    /// Events for unknown or finished threads
    pub ignored_events: usize,
    pub mismatched_exits: usize,
    pub threads: usize,
}

/// Result of a completed trace
#[derive(Debug)]
pub struct TraceOutcome {
    pub activations: ActivationList,
    pub termination: Termination,
    pub stats: TraceStats,
}

pub struct Dispatcher {
    settings: TraceSettings,
    class_filter: ClassFilter,
    activations: ActivationList,
    threads: HashMap<ThreadId, ThreadTrace>,
    subscriptions: Subscriptions,
    subscriptions_changed: bool,
    mode: TracingMode,
    stats: TraceStats,
    connected: bool,
    program_exited: bool,
}

impl Dispatcher {
    /// Create a dispatcher in immediate or deferred mode
    ///
    /// Deferred mode is chosen when a start method is configured.
    pub fn new(settings: &TraceSettings) -> Self {
        let class_filter = ClassFilter::new(settings.includes.clone(), settings.excludes.clone());

        let (mode, subscriptions) = match &settings.start_method {
            Some(start) => {
                info!("Tracing deferred until {} is reached", start);
                (TracingMode::AwaitingStart, Subscriptions::awaiting_class(start.owner.clone()))
            }
            None => {
                let mut subscriptions = Subscriptions::none();
                subscriptions.enable_method_tracing(class_filter.clone());
                (TracingMode::Tracing, subscriptions)
            }
        };

        Self {
            settings: settings.clone(),
            class_filter,
            activations: ActivationList::new(),
            threads: HashMap::new(),
            subscriptions,
            subscriptions_changed: true,
            mode,
            stats: TraceStats::default(),
            connected: true,
            program_exited: false,
        }
    }

    pub fn mode(&self) -> TracingMode {
        self.mode
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn activations(&self) -> &ActivationList {
        &self.activations
    }

    pub fn thread(&self, thread: ThreadId) -> Option<&ThreadTrace> {
        self.threads.get(&thread)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Drive `source` to the end of the stream
    ///
    /// **Public** - main entry point for tracing
    ///
    /// # Errors
    /// * `TraceError::StartMethodNotFound` / `UnexpectedBreakpoint` - fatal
    /// * `TraceError::Source` - the source failed for a reason other than disconnection
    pub fn run<S: EventSource + ?Sized>(
        mut self,
        source: &mut S,
    ) -> Result<TraceOutcome, TraceError> {
        info!("Starting event dispatch");
        self.publish_subscriptions(source);

        while self.connected {
            match source.next_batch() {
                Ok(Some(batch)) => {
                    self.process_batch(batch)?;
                    self.publish_subscriptions(source);
                    if self.connected {
                        source.resume()?;
                    }
                }
                Ok(None) => {
                    debug!("Event stream ended");
                    break;
                }
                Err(SourceError::Disconnected) => {
                    warn!("Lost connection to the traced program, draining remaining events");
                    self.drain(source);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(self.finish())
    }

    /// Process every event of one batch, in order
    pub fn process_batch(&mut self, batch: EventBatch) -> Result<(), TraceError> {
        self.stats.batches += 1;
        for event in batch {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Route one event
    ///
    /// # Errors
    /// Only deferred-start failures are fatal; everything else is recovered.
    pub fn handle_event(&mut self, event: TraceEvent) -> Result<(), TraceError> {
        self.stats.events += 1;

        if !self.subscriptions.delivers(&event) {
            match event.thread() {
                Some(thread) => trace!("Not subscribed to {} event on {}", event.kind(), thread),
                None => trace!("Not subscribed to {} event", event.kind()),
            }
            self.stats.filtered_events += 1;
            return Ok(());
        }

        match event {
            TraceEvent::ProgramStart => info!("-- Traced program started --"),
            TraceEvent::ProgramDeath => {
                info!("-- Traced program exited --");
                self.program_exited = true;
            }
            TraceEvent::Disconnect => {
                info!("-- Disconnected from traced program --");
                self.connected = false;
            }
            TraceEvent::ClassPrepared { owner, members, .. } => {
                self.class_prepared(&owner, &members)?;
            }
            TraceEvent::MethodEntry {
                thread,
                owner,
                member,
                frame_depth,
            } => {
                let Some(state) =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, true)
                else {
                    return Ok(());
                };
                let directives = state.method_entry(
                    &mut self.activations,
                    &self.settings,
                    &owner,
                    &member,
                    frame_depth,
                );
                self.apply_all(thread, directives);
            }
            TraceEvent::MethodExit { thread, owner, member } => {
                let Some(state) =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, false)
                else {
                    return Ok(());
                };
                let directives = state.method_exit(&self.activations, &owner, &member);
                self.apply_all(thread, directives);
            }
            TraceEvent::Exception { thread, owner } => {
                let Some(state) =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, false)
                else {
                    return Ok(());
                };
                debug!("{} exception thrown in {}", thread, owner);
                let directive = state.exception();
                self.apply(thread, directive);
            }
            TraceEvent::Step { thread, frame_depth } => {
                self.subscriptions.take_step(thread);
                self.subscriptions_changed = true;
                let Some(state) =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, false)
                else {
                    return Ok(());
                };
                state.step(&self.activations, frame_depth);
            }
            TraceEvent::Breakpoint {
                thread,
                owner,
                member,
                frame_depth,
            } => {
                let Some(start) = self.settings.start_method.clone() else {
                    return Ok(());
                };
                let Some(state) =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, true)
                else {
                    return Ok(());
                };
                let directive =
                    state.breakpoint(&mut self.activations, &start, &owner, &member, frame_depth)?;
                self.apply(thread, directive);
            }
            TraceEvent::ThreadDeath { thread } => {
                let state =
                    Self::live_thread(&mut self.threads, &mut self.stats, thread, false);
                if let Some(state) = state {
                    state.thread_death();
                }
            }
        }
        Ok(())
    }

    /// Thread state for an event, creating it when `create` is set
    ///
    /// Finished threads and, without `create`, unknown threads yield `None`.
    fn live_thread<'a>(
        threads: &'a mut HashMap<ThreadId, ThreadTrace>,
        stats: &mut TraceStats,
        thread: ThreadId,
        create: bool,
    ) -> Option<&'a mut ThreadTrace> {
        if create && !threads.contains_key(&thread) {
            stats.threads += 1;
            threads.insert(thread, ThreadTrace::new(thread));
        }
        match threads.get_mut(&thread) {
            Some(state) if !state.is_finished() => Some(state),
            _ => {
                trace!("Ignoring event for unknown or finished {}", thread);
                stats.ignored_events += 1;
                None
            }
        }
    }

    /// Arm breakpoints on every member named like the start method
    fn class_prepared(&mut self, owner: &str, members: &[MemberRef]) -> Result<(), TraceError> {
        let Some(start) = &self.settings.start_method else {
            return Ok(());
        };
        if owner != start.owner {
            return Ok(());
        }

        let breakpoints: Vec<Breakpoint> = members
            .iter()
            .filter(|m| m.name == start.member)
            .map(|m| Breakpoint {
                owner: owner.to_string(),
                member: m.clone(),
            })
            .collect();
        if breakpoints.is_empty() {
            return Err(TraceError::StartMethodNotFound(start.to_string()));
        }

        info!("{} is available, arming {} breakpoint(s)", owner, breakpoints.len());
        self.subscriptions.breakpoints.extend(breakpoints);
        self.subscriptions_changed = true;
        Ok(())
    }

    fn apply_all(&mut self, thread: ThreadId, directives: Vec<Directive>) {
        for directive in directives {
            self.apply(thread, directive);
        }
    }

    fn apply(&mut self, thread: ThreadId, directive: Directive) {
        match directive {
            Directive::SuppressFor { owner } => {
                if self.mode == TracingMode::Tracing {
                    self.subscriptions.suppress_for(owner);
                }
            }
            Directive::RestoreTracing => {
                if self.mode == TracingMode::Tracing {
                    self.subscriptions.enable_method_tracing(self.class_filter.clone());
                }
            }
            Directive::StopTracing => {
                info!("Start method returned on {}, tracing stopped", thread);
                self.mode = TracingMode::Stopped;
                self.subscriptions.clear_tracing();
            }
            Directive::StartTracing => {
                info!("Start method reached on {}, tracing all methods", thread);
                self.mode = TracingMode::Tracing;
                self.subscriptions.enable_method_tracing(self.class_filter.clone());
            }
            Directive::ArmStep => self.subscriptions.arm_step(thread),
        }
        self.subscriptions_changed = true;
    }

    fn publish_subscriptions<S: EventSource + ?Sized>(&mut self, source: &mut S) {
        if self.subscriptions_changed {
            debug!(
                "Publishing subscriptions (method tracing {})",
                if self.subscriptions.is_tracing() { "on" } else { "off" }
            );
            source.update_subscriptions(&self.subscriptions);
            self.subscriptions_changed = false;
        }
    }

    /// Pull what is left after the link dropped, honoring lifecycle events only
    fn drain<S: EventSource + ?Sized>(&mut self, source: &mut S) {
        while self.connected {
            match source.next_batch() {
                Ok(Some(batch)) => {
                    self.stats.batches += 1;
                    for event in batch.into_iter().filter(TraceEvent::is_lifecycle) {
                        if let Err(e) = self.handle_event(event) {
                            warn!("Ignoring failure while draining: {}", e);
                        }
                    }
                    if self.connected {
                        if let Err(e) = source.resume() {
                            warn!("Could not resume traced program while draining: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) | Err(SourceError::Disconnected) => break,
                Err(e) => {
                    warn!("Event source failed while draining: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop dispatching and hand over the activation list
    pub fn finish(mut self) -> TraceOutcome {
        self.stats.mismatched_exits =
            self.threads.values().map(ThreadTrace::mismatched_exits).sum();

        let termination = if self.program_exited {
            Termination::ProgramExited
        } else {
            warn!("Trace ended without the traced program exiting");
            Termination::LinkLost
        };

        info!(
            "Trace finished: {} root activations, {} events in {} batches",
            self.activations.len(),
            self.stats.events,
            self.stats.batches
        );

        TraceOutcome {
            activations: self.activations,
            termination,
            stats: self.stats,
        }
    }
}
