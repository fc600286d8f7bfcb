//! optistore - in-memory optimistic commits with three-way structural merge
//!
//! Writers read an immutable snapshot, derive a proposed value from it, and
//! commit `(baseline, proposed)`. Independent concurrent commits are folded
//! together; overlapping ones fail with a conflict naming the contested
//! paths.
//!
//! # Quick Start
//!
//! ```
//! use optistore::{set_in, Path, SystemStore, Value};
//!
//! let store = SystemStore::new(Value::mapping());
//!
//! // Two writers start from the same snapshot
//! let baseline = store.read();
//! let alice = set_in(&baseline, &Path::root().key("alice"), Value::Int(1)).unwrap();
//! let bob = set_in(&baseline, &Path::root().key("bob"), Value::Int(2)).unwrap();
//!
//! store.commit(&baseline, alice).unwrap();
//! store.commit(&baseline, bob).unwrap(); // merged, not lost
//!
//! assert_eq!(store.read().as_mapping().unwrap().len(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`optistore_core`]: values, paths, structural diff, leaf-path analysis
//! - [`optistore_concurrency`]: conflict resolvers and the versioned cell
//! - [`optistore_engine`]: the [`SystemStore`] façade and its configuration

pub use optistore_concurrency::{
    reconcile, ConflictError, ConflictResolver, Resolution, RetryConfig, Snapshot, StrictAbort,
    SwapError, SwapOutcome, ThreeWayMerge, VersionedCell,
};
pub use optistore_core::{
    apply, collisions, diff, disjoint, get_in, has_in, leaf_paths, remove_in, set_in, update_in,
    Delta, LeafPathSet, LimitError, Path, PathError, PathSegment, Value,
};
pub use optistore_engine::{
    AcceptAll, CommitError, CommitValidator, ConfigError, ConflictPolicy, StoreConfig, SystemStore,
};

pub use optistore_concurrency;
pub use optistore_core;
pub use optistore_engine;
