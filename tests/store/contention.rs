//! Commits racing from many threads against one store

use crate::common::*;
use optistore::set_in;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// N writers, one baseline, disjoint keys: every change lands
#[test]
fn independent_commits_from_one_baseline_all_land() {
    init_tracing();
    let num_threads = 16;
    let baseline = Arc::new(library());
    let store = Arc::new(SystemStore::new((*baseline).clone()));

    let results = {
        let store = Arc::clone(&store);
        let baseline = Arc::clone(&baseline);
        run_concurrent(num_threads, move |i| {
            let member = path(&format!(
                r#"userManagement.membersByEmail["member{}@example.com"]"#,
                i
            ));
            let proposed = set_in(&baseline, &member, v(json!({"name": i, "lendings": []})))
                .expect("set_in on library document");
            store.commit(&baseline, proposed)
        })
    };
    for result in results {
        result.unwrap();
    }

    // Expected: the baseline with all N members folded in, in any order
    let mut expected = (*baseline).clone();
    for i in 0..num_threads {
        let member = path(&format!(
            r#"userManagement.membersByEmail["member{}@example.com"]"#,
            i
        ));
        expected = set_in(&expected, &member, v(json!({"name": i, "lendings": []}))).unwrap();
    }
    assert_eq!(*store.read(), expected);
    assert_eq!(store.version(), 1 + num_threads as u64);
}

/// Counter increments via transact: conflicts are retried against fresh reads
#[test]
fn transact_serializes_read_modify_write() {
    let num_threads = 8;
    let per_thread = 25;
    let config = StoreConfig::default().with_transact_retries(usize::MAX);
    let store = Arc::new(SystemStore::with_config(v(json!({"count": 0})), config));

    {
        let store = Arc::clone(&store);
        run_concurrent(num_threads, move |_| {
            for _ in 0..per_thread {
                store
                    .transact(|current| {
                        let n = current.as_mapping().unwrap()["count"].as_int().unwrap();
                        Ok(v(json!({"count": n + 1})))
                    })
                    .unwrap();
            }
        });
    }

    assert_eq!(
        *store.read(),
        v(json!({"count": (num_threads * per_thread) as i64}))
    );
}

/// Writers racing on one key from one baseline: one wins, the rest conflict
#[test]
fn overlapping_commits_single_winner() {
    let num_threads = 8;
    let baseline = Arc::new(v(json!({"owner": null, "other": 0})));
    let store = Arc::new(SystemStore::new((*baseline).clone()));
    let wins = Arc::new(AtomicUsize::new(0));

    {
        let store = Arc::clone(&store);
        let baseline = Arc::clone(&baseline);
        let wins = Arc::clone(&wins);
        run_concurrent(num_threads, move |i| {
            let proposed = set_in(&baseline, &path("owner"), Value::Int(i as i64)).unwrap();
            match store.commit(&baseline, proposed) {
                Ok(_) => {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
            }
        });
    }

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(store.version(), 2);
}

/// Readers running alongside writers always see a committed snapshot
#[test]
fn readers_never_see_partial_commits() {
    let store = Arc::new(SystemStore::new(v(json!({"left": 0, "right": 0}))));
    let writers = 4;

    {
        let store = Arc::clone(&store);
        run_concurrent(writers + 1, move |i| {
            if i == 0 {
                for _ in 0..2_000 {
                    let snapshot = store.read();
                    let map = snapshot.as_mapping().unwrap();
                    assert_eq!(map["left"], map["right"]);
                }
            } else {
                for _ in 0..100 {
                    let _ = store.transact(|current| {
                        let n = current.as_mapping().unwrap()["left"].as_int().unwrap();
                        Ok(v(json!({"left": n + 1, "right": n + 1})))
                    });
                }
            }
        });
    }
}
