use pretty_assertions::assert_eq;
use seqtrace::model::MemberRef;
use seqtrace::tracer::{
    Dispatcher, MemoryEventSource, RecordedEventSource, Termination, ThreadId, ThreadState,
    TraceConfig, TraceEvent, TraceSettings, TracingMode,
};
use seqtrace::utils::TraceError;
use std::io::Cursor;

fn entry(thread: u64, owner: &str, member: MemberRef, depth: i32) -> TraceEvent {
    TraceEvent::MethodEntry {
        thread: ThreadId(thread),
        owner: owner.to_string(),
        member,
        frame_depth: depth,
    }
}

fn call(thread: u64, owner: &str, name: &str, depth: i32) -> TraceEvent {
    entry(thread, owner, MemberRef::new(name), depth)
}

fn ret(thread: u64, owner: &str, name: &str) -> TraceEvent {
    TraceEvent::MethodExit {
        thread: ThreadId(thread),
        owner: owner.to_string(),
        member: MemberRef::new(name),
    }
}

fn settings(config: TraceConfig) -> TraceSettings {
    config.validate().unwrap()
}

#[test]
fn test_nested_calls_and_program_exit() {
    let mut source = MemoryEventSource::new(vec![
        vec![TraceEvent::ProgramStart],
        vec![call(1, "Bank", "withdraw", 1), call(1, "Account", "debit", 2)],
        vec![ret(1, "Account", "debit"), call(1, "Audit", "log", 2), ret(1, "Audit", "log")],
        vec![ret(1, "Bank", "withdraw"), call(1, "Bank", "close", 1)],
        vec![TraceEvent::ThreadDeath { thread: ThreadId(1) }, TraceEvent::ProgramDeath],
        vec![TraceEvent::Disconnect],
        vec![call(1, "Never", "seen", 1)],
    ]);

    let outcome = Dispatcher::new(&settings(TraceConfig::default()))
        .run(&mut source)
        .unwrap();

    assert_eq!(
        outcome.activations.to_string(),
        "Bank.withdraw\n    Account.debit\n    Audit.log\nBank.close\n"
    );
    assert_eq!(outcome.termination, Termination::ProgramExited);
    assert_eq!(outcome.stats.threads, 1);
    assert_eq!(outcome.stats.batches, 6);
    // Resumed after every batch except the one carrying the disconnect
    assert_eq!(source.resumes(), 5);
}

#[test]
fn test_boundary_method_suppresses_callees() {
    let settings = settings(TraceConfig {
        boundary_methods: vec!["Db.query".to_string()],
        ..Default::default()
    });
    let mut dispatcher = Dispatcher::new(&settings);

    dispatcher
        .process_batch(vec![
            call(1, "App", "main", 1),
            call(1, "Db", "query", 2),
            call(1, "Db", "connect", 3),
            call(1, "Pool", "get", 4),
            ret(1, "Pool", "get"),
            // Scoped to the boundary owner, so this exit still arrives
            ret(1, "Db", "connect"),
        ])
        .unwrap();
    assert_eq!(
        dispatcher.thread(ThreadId(1)).map(|t| t.state()),
        Some(ThreadState::BoundarySuppressed)
    );
    assert!(dispatcher.subscriptions().method_events.is_none());

    dispatcher
        .process_batch(vec![ret(1, "Db", "query"), call(1, "App", "render", 2)])
        .unwrap();
    assert!(dispatcher.subscriptions().method_events.is_some());

    let outcome = dispatcher.finish();
    assert_eq!(
        outcome.activations.to_string(),
        "App.main\n    Db.query\n    App.render\n"
    );
    assert_eq!(outcome.stats.mismatched_exits, 1);
}

#[test]
fn test_exception_unwinds_to_catching_frame() {
    let mut dispatcher = Dispatcher::new(&settings(TraceConfig::default()));

    dispatcher
        .process_batch(vec![
            call(1, "A", "a", 1),
            call(1, "B", "b", 2),
            call(1, "C", "c", 3),
            TraceEvent::Exception {
                thread: ThreadId(1),
                owner: "C".to_string(),
            },
        ])
        .unwrap();
    assert_eq!(
        dispatcher.thread(ThreadId(1)).map(|t| t.state()),
        Some(ThreadState::Unwinding)
    );

    dispatcher
        .process_batch(vec![
            TraceEvent::Step { thread: ThreadId(1), frame_depth: 2 },
            call(1, "D", "d", 3),
            // Only one step was armed
            TraceEvent::Step { thread: ThreadId(1), frame_depth: 1 },
        ])
        .unwrap();

    let outcome = dispatcher.finish();
    assert_eq!(
        outcome.activations.to_string(),
        "A.a\n    B.b\n        C.c\n        D.d\n"
    );
    assert_eq!(outcome.stats.filtered_events, 1);
}

#[test]
fn test_deferred_start_traces_only_start_method() {
    let settings = settings(TraceConfig {
        start_method: Some("App.run".to_string()),
        ..Default::default()
    });
    let mut dispatcher = Dispatcher::new(&settings);
    assert_eq!(dispatcher.mode(), TracingMode::AwaitingStart);

    dispatcher
        .process_batch(vec![
            TraceEvent::ProgramStart,
            call(1, "App", "main", 1),
            TraceEvent::ClassPrepared {
                thread: ThreadId(1),
                owner: "App".to_string(),
                members: vec![
                    MemberRef::new("main"),
                    MemberRef::new("run"),
                    MemberRef::new("run").with_args(["int"]),
                ],
            },
        ])
        .unwrap();
    assert!(dispatcher.activations().is_empty());
    assert_eq!(dispatcher.subscriptions().breakpoints.len(), 2);

    dispatcher
        .process_batch(vec![TraceEvent::Breakpoint {
            thread: ThreadId(1),
            owner: "App".to_string(),
            member: MemberRef::new("run"),
            frame_depth: 2,
        }])
        .unwrap();
    assert_eq!(dispatcher.mode(), TracingMode::Tracing);
    assert!(dispatcher.subscriptions().breakpoints.is_empty());
    assert!(dispatcher.subscriptions().class_prepare.is_none());

    dispatcher
        .process_batch(vec![
            call(1, "Service", "handle", 3),
            ret(1, "Service", "handle"),
            ret(1, "App", "run"),
        ])
        .unwrap();
    assert_eq!(dispatcher.mode(), TracingMode::Stopped);

    dispatcher
        .process_batch(vec![
            call(1, "App", "shutdown", 2),
            TraceEvent::Breakpoint {
                thread: ThreadId(1),
                owner: "App".to_string(),
                member: MemberRef::new("run").with_args(["int"]),
                frame_depth: 2,
            },
            TraceEvent::ProgramDeath,
        ])
        .unwrap();

    let outcome = dispatcher.finish();
    assert_eq!(outcome.activations.to_string(), "App.run\n    Service.handle\n");
    assert_eq!(outcome.termination, Termination::ProgramExited);
}

#[test]
fn test_unexpected_breakpoint_is_fatal() {
    let settings = settings(TraceConfig {
        start_method: Some("App.run".to_string()),
        ..Default::default()
    });
    let mut source = MemoryEventSource::new(vec![
        vec![TraceEvent::ClassPrepared {
            thread: ThreadId(1),
            owner: "App".to_string(),
            members: vec![MemberRef::new("run")],
        }],
        vec![TraceEvent::Breakpoint {
            thread: ThreadId(1),
            owner: "App".to_string(),
            member: MemberRef::new("main"),
            frame_depth: 1,
        }],
    ]);

    let result = Dispatcher::new(&settings).run(&mut source);
    assert!(matches!(result, Err(TraceError::UnexpectedBreakpoint { .. })));
}

#[test]
fn test_public_only_skips_private_entries() {
    let settings = settings(TraceConfig {
        public_only: true,
        ..Default::default()
    });
    let mut dispatcher = Dispatcher::new(&settings);

    dispatcher
        .process_batch(vec![
            call(1, "A", "api", 1),
            entry(1, "A", MemberRef::new("helper").private(), 2),
            call(1, "B", "api", 3),
            ret(1, "B", "api"),
        ])
        .unwrap();

    assert_eq!(dispatcher.activations().to_string(), "A.api\n    B.api\n");
}

#[test]
fn test_disconnect_drains_lifecycle_events_only() {
    let mut source = MemoryEventSource::new(vec![
        vec![call(1, "A", "a", 1)],
        vec![call(1, "B", "b", 2), TraceEvent::ProgramDeath],
        vec![TraceEvent::Disconnect],
        vec![call(1, "C", "c", 2)],
    ])
    .disconnect_after(1);

    let outcome = Dispatcher::new(&settings(TraceConfig::default()))
        .run(&mut source)
        .unwrap();

    assert_eq!(outcome.activations.to_string(), "A.a\n");
    assert_eq!(outcome.termination, Termination::ProgramExited);
}

#[test]
fn test_stream_end_without_exit_is_link_lost() {
    let mut source = MemoryEventSource::new(vec![vec![call(1, "A", "a", 1)]]);

    let outcome = Dispatcher::new(&settings(TraceConfig::default()))
        .run(&mut source)
        .unwrap();

    assert_eq!(outcome.termination, Termination::LinkLost);
    assert_eq!(outcome.activations.node_count(), 1);
}

#[test]
fn test_events_for_unknown_or_finished_threads_are_ignored() {
    let mut dispatcher = Dispatcher::new(&settings(TraceConfig::default()));

    dispatcher
        .process_batch(vec![
            TraceEvent::Exception {
                thread: ThreadId(9),
                owner: "A".to_string(),
            },
            TraceEvent::ThreadDeath { thread: ThreadId(9) },
            call(1, "A", "a", 1),
            TraceEvent::ThreadDeath { thread: ThreadId(1) },
            call(1, "A", "late", 2),
        ])
        .unwrap();

    assert!(dispatcher.thread(ThreadId(9)).is_none());
    assert!(dispatcher.subscriptions().single_steps.is_empty());
    assert_eq!(dispatcher.activations().to_string(), "A.a\n");

    let outcome = dispatcher.finish();
    assert_eq!(outcome.stats.ignored_events, 3);
}

#[test]
fn test_subscription_changes_reach_the_source() {
    let settings = settings(TraceConfig {
        boundary_methods: vec!["Db.query".to_string()],
        ..Default::default()
    });
    let mut source = MemoryEventSource::new(vec![
        vec![call(1, "Db", "query", 1)],
        vec![ret(1, "Db", "query")],
        vec![TraceEvent::ProgramDeath],
    ]);

    Dispatcher::new(&settings).run(&mut source).unwrap();

    let updates = source.subscription_updates();
    assert_eq!(updates.len(), 3);
    assert!(updates[0].method_events.is_some());
    assert_eq!(updates[1].scoped_exit.as_deref(), Some("Db"));
    assert!(updates[2].method_events.is_some());
}

#[test]
fn test_skipped_boundary_entry_still_restores_tracing() {
    let settings = settings(TraceConfig {
        boundary_methods: vec!["Db.query".to_string()],
        public_only: true,
        ..Default::default()
    });
    let mut dispatcher = Dispatcher::new(&settings);

    dispatcher
        .process_batch(vec![
            entry(1, "Db", MemberRef::new("query").private(), 1),
            ret(1, "Db", "query"),
            call(1, "App", "main", 1),
        ])
        .unwrap();

    assert!(dispatcher.subscriptions().method_events.is_some());
    assert_eq!(
        dispatcher.thread(ThreadId(1)).map(|t| t.state()),
        Some(ThreadState::Tracing)
    );
    assert_eq!(dispatcher.activations().to_string(), "App.main\n");
}

#[test]
fn test_stop_wins_over_restore_on_the_same_exit() {
    let settings = settings(TraceConfig {
        start_method: Some("App.run".to_string()),
        boundary_methods: vec!["App.run".to_string()],
        public_only: true,
        ..Default::default()
    });
    let mut dispatcher = Dispatcher::new(&settings);

    dispatcher
        .process_batch(vec![
            TraceEvent::ClassPrepared {
                thread: ThreadId(1),
                owner: "App".to_string(),
                members: vec![MemberRef::new("run")],
            },
            TraceEvent::Breakpoint {
                thread: ThreadId(1),
                owner: "App".to_string(),
                member: MemberRef::new("run"),
                frame_depth: 1,
            },
            // Private overload: suppresses as a boundary but is not recorded
            entry(1, "App", MemberRef::new("run").with_args(["int"]).private(), 2),
        ])
        .unwrap();
    assert_eq!(dispatcher.subscriptions().scoped_exit.as_deref(), Some("App"));

    // Matches the open start activation by owner and name, emptying the stack
    dispatcher
        .process_batch(vec![
            TraceEvent::MethodExit {
                thread: ThreadId(1),
                owner: "App".to_string(),
                member: MemberRef::new("run").with_args(["int"]),
            },
            call(1, "App", "after", 1),
        ])
        .unwrap();

    assert_eq!(dispatcher.mode(), TracingMode::Stopped);
    assert!(!dispatcher.subscriptions().is_tracing());
    assert_eq!(dispatcher.activations().to_string(), "App.run\n");
}

#[test]
fn test_recording_with_invalid_utf8_keeps_the_tree() {
    let mut recording = Vec::new();
    recording.extend_from_slice(
        br#"{"kind":"method_entry","thread":1,"owner":"A","member":{"name":"a"},"frame_depth":1}"#,
    );
    recording.extend_from_slice(b"\ngarbage \xff\xfe line\n");
    recording.extend_from_slice(
        br#"{"kind":"method_entry","thread":1,"owner":"B","member":{"name":"b"},"frame_depth":2}"#,
    );
    recording.push(b'\n');
    let mut source = RecordedEventSource::from_reader(Cursor::new(recording));

    let outcome = Dispatcher::new(&settings(TraceConfig::default()))
        .run(&mut source)
        .unwrap();

    assert_eq!(outcome.activations.to_string(), "A.a\n    B.b\n");
    assert_eq!(source.skipped_lines(), 1);
}
