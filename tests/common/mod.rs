//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::{Arc, Barrier, Once};
use std::thread::{self, JoinHandle};

pub use optistore::{
    CommitError, ConflictError, ConflictPolicy, Path, RetryConfig, StoreConfig, SystemStore, Value,
};
pub use serde_json::json;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (shown with --nocapture)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Value helpers
// ============================================================================

/// Build a Value from a JSON literal
pub fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Parse a path, panicking on malformed test input
pub fn path(text: &str) -> Path {
    text.parse().expect("valid test path")
}

/// Library-shaped document used by the scenario tests
pub fn library() -> Value {
    v(json!({
        "catalog": {
            "booksByIsbn": {
                "978-1779501127": {"title": "Watchmen", "authorIds": ["alan-moore"]},
                "978-1935548713": {"title": "Brave New World", "authorIds": ["aldous-huxley"]}
            },
            "authorsById": {
                "alan-moore": {"name": "Alan Moore", "bookIsbns": ["978-1779501127"]},
                "aldous-huxley": {"name": "Aldous Huxley", "bookIsbns": ["978-1935548713"]}
            }
        },
        "userManagement": {
            "membersByEmail": {
                "samantha@gmail.com": {"name": "Samantha", "lendings": []}
            },
            "librariansByEmail": {}
        }
    }))
}

// ============================================================================
// Thread helpers
// ============================================================================

/// Run `f(i)` on `n` threads released together by a barrier; returns results in thread order
pub fn run_concurrent<F, T>(n: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(n));
    let f = Arc::new(f);

    let handles: Vec<JoinHandle<T>> = (0..n)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect()
}
