use pretty_assertions::assert_eq;
use seqtrace::model::{ActivationList, ActivationRef, ColumnMap, MemberRef, QualifiedMethod};
use seqtrace::transform::{
    collapse_repetitions, filter, find, prepare_for_diagram, ActivationFilter, ConstructorFilter,
    SuperclassTable,
};
use seqtrace::tracer::TraceConfig;
use std::sync::Arc;

/// Scenarios.testWithdrawal
///     Foo.<init>
///         Bar.<init>
///         Bar.frotz (5 times)
///     Foo.bar
///     Foo.baz
fn withdrawal() -> ActivationList {
    let mut list = ActivationList::new();
    let root = list.add_root("Scenarios", MemberRef::new("testWithdrawal"));
    let foo = list.add_child(root, "Foo", MemberRef::constructor());
    list.add_child(foo, "Bar", MemberRef::constructor());
    for _ in 0..5 {
        list.add_child(foo, "Bar", MemberRef::new("frotz"));
    }
    list.add_child(root, "Foo", MemberRef::new("bar"));
    list.add_child(root, "Foo", MemberRef::new("baz"));
    list
}

fn accept_all(_: ActivationRef<'_>) -> bool {
    true
}

#[test]
fn test_fixture_shape() {
    let list = withdrawal();
    assert_eq!(list.len(), 1);
    assert_eq!(list.node_count(), 10);
    assert_eq!(list.root(0).unwrap().num_calls(), 3);
}

#[test]
fn test_filter_excluding_bar() {
    let list = withdrawal();
    let filtered = filter(&list, &ActivationFilter::exclude("Bar.*"));

    assert_eq!(filtered.len(), 1);
    let root = filtered.root(0).unwrap();
    assert_eq!(root.num_calls(), 3);
    let foo = root.child(0).unwrap();
    assert_eq!(foo.qualified_name(), "Foo.<init>");
    assert_eq!(foo.num_calls(), 0);

    // The original is untouched
    assert_eq!(list.node_count(), 10);
}

#[test]
fn test_find_foo_constructor() {
    let list = withdrawal();
    let method = QualifiedMethod::parse("Foo.<init>").unwrap();
    let found = find(&list, &ActivationFilter::method(method));

    assert_eq!(found.len(), 1);
    let lifted = found.root(0).unwrap();
    assert_eq!(lifted.qualified_name(), "Foo.<init>");
    assert!(lifted.parent().is_none());
    assert_eq!(lifted.num_calls(), 6);
}

#[test]
fn test_collapse_repetitions_on_fixture() {
    let list = withdrawal();
    let collapsed = collapse_repetitions(&list);

    let foo = collapsed.root(0).unwrap().child(0).unwrap();
    assert_eq!(foo.num_calls(), 2);
    let bar_init = foo.child(0).unwrap();
    let frotz = foo.child(1).unwrap();
    assert_eq!(bar_init.qualified_name(), "Bar.<init>");
    assert_eq!(bar_init.repetitions(), 1);
    assert_eq!(frotz.qualified_name(), "Bar.frotz");
    assert_eq!(frotz.repetitions(), 5);

    assert_eq!(list.root(0).unwrap().child(0).unwrap().num_calls(), 6);
    assert_eq!(
        collapsed.to_string(),
        "Scenarios.testWithdrawal\n    Foo.<init>\n        Bar.<init>\n        Bar.frotz (x 5)\n    Foo.bar\n    Foo.baz\n"
    );
}

#[test]
fn test_filter_accepting_everything_is_identity() {
    let list = withdrawal();
    let filtered = filter(&list, &accept_all);
    assert_eq!(filtered, list);
    assert_eq!(filtered.node_count(), list.node_count());
}

#[test]
fn test_find_matching_only_roots_equals_copy() {
    let mut list = withdrawal();
    list.add_root("Worker", MemberRef::new("run"));

    let roots_only = |a: ActivationRef<'_>| a.parent().is_none() && a.owner() == "Scenarios";
    let found = find(&list, &roots_only);

    let expected = list.root(0).unwrap().to_list();
    assert_eq!(found, expected);
    assert_eq!(find(&found, &roots_only), found);
}

#[test]
fn test_structural_equality_laws() {
    let a = withdrawal();
    let b = withdrawal();
    let c = b.copy();

    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(b, c);
    assert_eq!(a, c);

    let different = filter(&a, &ActivationFilter::exclude("*.baz"));
    assert_ne!(a, different);
    assert_ne!(different, a);
}

#[test]
fn test_copy_is_independent() {
    let list = withdrawal();
    let mut copy = list.copy();
    assert_eq!(copy, list);

    let root = copy.root_ids()[0];
    copy.add_child(root, "Foo", MemberRef::new("extra"));
    assert_ne!(copy, list);
    assert_eq!(list.root(0).unwrap().num_calls(), 3);
}

#[test]
fn test_constructor_suppression_removes_base_constructor() {
    let mut list = ActivationList::new();
    let derived = list.add_root("Derived", MemberRef::constructor());
    list.add_child(derived, "Base", MemberRef::constructor());
    list.add_child(derived, "Derived", MemberRef::new("init"));

    let mut hierarchy = SuperclassTable::new();
    hierarchy.insert("Derived", "Base");
    let filtered = filter(&list, &ConstructorFilter::new(Arc::new(hierarchy)));

    assert_eq!(filtered.to_string(), "Derived.<init>\n    Derived.init\n");
}

#[test]
fn test_column_assignment_first_seen() {
    let mut list = ActivationList::new();
    let a = list.add_root("A", MemberRef::new("a"));
    let b = list.add_child(a, "B", MemberRef::new("b"));
    list.add_child(b, "A", MemberRef::new("back"));
    list.add_child(a, "C", MemberRef::new("c"));

    let columns = ColumnMap::from_activations(&list);
    assert_eq!(columns.column("A"), Some(0));
    assert_eq!(columns.column("B"), Some(1));
    assert_eq!(columns.column("C"), Some(2));
    assert_eq!(columns.len(), 3);
}

#[test]
fn test_pipeline_on_fixture() {
    let config = TraceConfig {
        start_method: Some("Foo.<init>".to_string()),
        exclude: vec!["*.frotz".to_string()],
        ..Default::default()
    };
    let settings = config.validate().unwrap();

    let prepared = prepare_for_diagram(&withdrawal(), &settings, Arc::new(SuperclassTable::new()));
    assert_eq!(prepared.to_string(), "Foo.<init>\n    Bar.<init>\n");
}
