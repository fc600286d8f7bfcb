//! Three-way merge scenarios through SystemStore::commit

use crate::common::*;
use optistore::{get_in, reconcile, set_in, update_in};

#[test]
fn fast_forward_installs_proposal() {
    let store = SystemStore::new(v(json!({"a": 1})));
    let baseline = store.read();
    let snapshot = store.commit(&baseline, v(json!({"b": [1, 2]}))).unwrap();
    assert_eq!(*snapshot, v(json!({"b": [1, 2]})));
}

#[test]
fn reconcile_fast_forward_for_any_proposal() {
    let baseline = library();
    for proposed in [Value::Null, Value::Int(3), v(json!({"x": {"y": []}})), library()] {
        assert_eq!(reconcile(&baseline, &baseline, &proposed).unwrap(), proposed);
    }
}

#[test]
fn independent_writers_merge() {
    let store = SystemStore::new(v(json!({"a": 1, "b": 1})));
    let baseline = store.read();

    store.commit(&baseline, v(json!({"a": 2, "b": 1}))).unwrap();
    let merged = store.commit(&baseline, v(json!({"a": 1, "b": 2}))).unwrap();

    assert_eq!(*merged, v(json!({"a": 2, "b": 2})));
}

#[test]
fn same_leaf_conflicts_with_path() {
    let store = SystemStore::new(v(json!({"a": 1})));
    let baseline = store.read();
    store.commit(&baseline, v(json!({"a": 2}))).unwrap();

    match store.commit(&baseline, v(json!({"a": 3}))) {
        Err(CommitError::Conflict(ConflictError::ConcurrentMutation { paths })) => {
            assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec![path("a")]);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(*store.read(), v(json!({"a": 2})));
}

#[test]
fn noop_proposal_returns_current() {
    let store = SystemStore::new(v(json!({"a": 1})));
    let baseline = store.read();
    store.commit(&baseline, v(json!({"a": 1, "z": true}))).unwrap();

    let kept = store.commit(&baseline, (*baseline).clone()).unwrap();
    assert_eq!(*kept, v(json!({"a": 1, "z": true})));
}

#[test]
fn borrowing_a_book_merges_with_catalog_edit() {
    init_tracing();
    let store = SystemStore::new(library());
    let baseline = store.read();

    // Librarian retitles a book
    let retitled = set_in(
        &baseline,
        &path(r#"catalog.booksByIsbn["978-1935548713"].title"#),
        Value::from("Brave New World (Revised)"),
    )
    .unwrap();

    // Member borrows the other book, from the same baseline
    let lending = path(r#"userManagement.membersByEmail["samantha@gmail.com"].lendings"#);
    let borrowed = update_in(&baseline, &lending, |current| {
        let mut items = current
            .and_then(Value::as_sequence)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        items.push(v(json!({"isbn": "978-1779501127"})));
        Value::Sequence(items)
    })
    .unwrap();

    store.commit(&baseline, retitled).unwrap();
    let merged = store.commit(&baseline, borrowed).unwrap();

    assert_eq!(
        get_in(&merged, &path(r#"catalog.booksByIsbn["978-1935548713"].title"#)),
        Some(&Value::from("Brave New World (Revised)"))
    );
    assert_eq!(
        get_in(&merged, &lending),
        Some(&v(json!([{"isbn": "978-1779501127"}])))
    );
}

#[test]
fn appends_to_different_sequences_merge() {
    let store = SystemStore::new(v(json!({"x": [1], "y": [1]})));
    let baseline = store.read();

    store.commit(&baseline, v(json!({"x": [1, 2], "y": [1]}))).unwrap();
    let merged = store.commit(&baseline, v(json!({"x": [1], "y": [1, 3]}))).unwrap();

    assert_eq!(*merged, v(json!({"x": [1, 2], "y": [1, 3]})));
}

#[test]
fn concurrent_appends_to_one_sequence_conflict() {
    let store = SystemStore::new(v(json!({"log": ["a"]})));
    let baseline = store.read();

    store.commit(&baseline, v(json!({"log": ["a", "b"]}))).unwrap();
    let err = store
        .commit(&baseline, v(json!({"log": ["a", "c"]})))
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn adding_the_same_new_key_twice_conflicts() {
    let store = SystemStore::new(library());
    let baseline = store.read();
    let key = path(r#"userManagement.librariansByEmail["franck@gmail.com"]"#);

    let first = set_in(&baseline, &key, v(json!({"name": "Franck"}))).unwrap();
    let second = set_in(&baseline, &key, v(json!({"name": "Frank"}))).unwrap();

    store.commit(&baseline, first).unwrap();
    let err = store.commit(&baseline, second).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn first_entries_of_a_new_index_merge() {
    let store = SystemStore::new(library());
    let baseline = store.read();
    let index = path("userManagement.adminsByEmail");

    let first = set_in(&baseline, &index, v(json!({"ann@x.org": {"name": "Ann"}}))).unwrap();
    let second = set_in(&baseline, &index, v(json!({"bob@x.org": {"name": "Bob"}}))).unwrap();

    store.commit(&baseline, first).unwrap();
    let merged = store.commit(&baseline, second).unwrap();

    assert_eq!(
        get_in(&merged, &index),
        Some(&v(json!({
            "ann@x.org": {"name": "Ann"},
            "bob@x.org": {"name": "Bob"}
        })))
    );
}

#[test]
fn edit_inside_removed_subtree_conflicts() {
    let store = SystemStore::new(library());
    let baseline = store.read();
    let member = path(r#"userManagement.membersByEmail["samantha@gmail.com"]"#);

    let removed = optistore::remove_in(&baseline, &member).unwrap();
    let renamed = set_in(&baseline, &member.clone().key("name"), Value::from("Sam")).unwrap();

    store.commit(&baseline, removed).unwrap();
    match store.commit(&baseline, renamed) {
        Err(CommitError::Conflict(conflict)) => {
            assert!(conflict.paths().contains(&member));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn type_change_is_an_ordinary_leaf_change() {
    let store = SystemStore::new(v(json!({"settings": {"theme": "dark"}, "n": 0})));
    let baseline = store.read();

    store
        .commit(&baseline, v(json!({"settings": "default", "n": 0})))
        .unwrap();
    let merged = store
        .commit(&baseline, v(json!({"settings": {"theme": "dark"}, "n": 1})))
        .unwrap();
    assert_eq!(*merged, v(json!({"settings": "default", "n": 1})));
}
