//! Undo through the commit history

use crate::common::*;
use optistore::set_in;

#[test]
fn undo_restores_previous_value() {
    let store = SystemStore::new(library());
    let baseline = store.read();
    let proposed = set_in(
        &baseline,
        &path(r#"userManagement.librariansByEmail["franck@gmail.com"]"#),
        v(json!({"name": "Franck"})),
    )
    .unwrap();
    store.commit(&baseline, proposed).unwrap();

    store.undo().unwrap();
    assert_eq!(*store.read(), library());
}

#[test]
fn undo_preserves_later_independent_commits() {
    let store = SystemStore::new(v(json!({"a": 1, "b": 1})));

    let baseline = store.read();
    store.commit(&baseline, v(json!({"a": 2, "b": 1}))).unwrap();
    let baseline = store.read();
    store.commit(&baseline, v(json!({"a": 2, "b": 2}))).unwrap();

    // Two undos walk back in order
    store.undo().unwrap();
    store.undo().unwrap();
    assert_eq!(*store.read(), v(json!({"a": 1, "b": 1})));
    assert!(matches!(store.undo(), Err(CommitError::NothingToUndo)));
}

#[test]
fn undo_is_not_itself_recorded() {
    let store = SystemStore::new(Value::Int(0));
    let baseline = store.read();
    store.commit(&baseline, Value::Int(1)).unwrap();

    store.undo().unwrap();
    assert_eq!(store.history_len(), 0);
    assert_eq!(*store.read(), Value::Int(0));
}

#[test]
fn reset_discards_history() {
    let store = SystemStore::new(Value::Int(0));
    let baseline = store.read();
    store.commit(&baseline, Value::Int(1)).unwrap();

    store.reset(v(json!({"fresh": true})));
    assert!(matches!(store.undo(), Err(CommitError::NothingToUndo)));
    assert_eq!(*store.read(), v(json!({"fresh": true})));
}

#[test]
fn undo_after_racing_commits_reverts_newest_first() {
    init_tracing();
    const WRITERS: usize = 8;
    let store = std::sync::Arc::new(SystemStore::new(Value::mapping()));

    let installed = {
        let store = std::sync::Arc::clone(&store);
        run_concurrent(WRITERS, move |i| {
            let name = format!("w{}", i);
            let snapshot = store
                .transact(|current| {
                    set_in(current, &Path::root().key(name.as_str()), Value::Int(i as i64))
                        .map_err(|e| CommitError::rejected(e.to_string()))
                })
                .unwrap();
            (snapshot.version(), name)
        })
    };

    let mut newest_first = installed;
    newest_first.sort_by(|a, b| b.0.cmp(&a.0));
    assert_eq!(store.history_len(), WRITERS);

    for (version, name) in &newest_first {
        store.undo().unwrap();
        let now = store.read();
        let keys = now.as_mapping().unwrap();
        assert!(!keys.contains_key(name), "undo skipped version {}", version);
        for (older_version, older) in newest_first.iter().filter(|(v, _)| v < version) {
            assert!(keys.contains_key(older), "undo reverted version {} early", older_version);
        }
    }
    assert_eq!(*store.read(), Value::mapping());
}
