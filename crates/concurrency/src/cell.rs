//! VersionedCell: compare-and-set cell holding one immutable snapshot
//!
//! ## Design
//!
//! The cell owns exactly one `Arc<Value>` at a time. Values are never
//! mutated in place: every update installs a whole new snapshot, so a reader
//! always sees either the old or the new value in full.
//!
//! Compare-and-set compares snapshot identity (`Arc::ptr_eq`), not deep
//! equality. A caller holding `expected` keeps that allocation alive, so the
//! address cannot be reused by a later snapshot.
//!
//! ## API
//!
//! - `read`, `snapshot`, `version`
//! - `compare_and_set`: single attempt
//! - `swap`: infallible update, retried until it lands
//! - `try_swap`: fallible update with a retry policy
//! - `reset`: unconditional replacement

use optistore_core::Value;
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::retry::RetryConfig;

/// A committed value together with the version it was installed at
///
/// Versions start at 1 and increase by one per installed snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    value: Arc<Value>,
    version: u64,
}

impl Snapshot {
    /// The shared value
    pub fn value(&self) -> &Arc<Value> {
        &self.value
    }

    /// Version this snapshot was installed at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Take the shared value
    pub fn into_value(self) -> Arc<Value> {
        self.value
    }

    /// True if both snapshots hold the same allocation
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Deref for Snapshot {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.value == other.value
    }
}

/// Result of a successful [`VersionedCell::try_swap`]
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Snapshot the update function was applied to
    pub previous: Snapshot,
    /// Snapshot held by the cell afterwards
    ///
    /// Equal to `previous` when the update function returned its input.
    pub current: Snapshot,
}

impl SwapOutcome {
    /// True if a new snapshot was installed
    pub fn installed(&self) -> bool {
        self.current.version != self.previous.version
    }
}

/// Error type for [`VersionedCell::try_swap`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError<E> {
    /// The update function refused; nothing was installed
    #[error("update aborted: {0}")]
    Aborted(E),
    /// Every allowed attempt lost the compare-and-set race
    #[error("compare-and-set failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: usize,
    },
}

/// Concurrency-safe cell holding the latest committed value
///
/// # Example
///
/// ```
/// use optistore_concurrency::VersionedCell;
/// use optistore_core::Value;
///
/// let cell = VersionedCell::new(Value::Int(0));
/// let snapshot = cell.swap(|v| Value::Int(v.as_int().unwrap_or(0) + 1));
/// assert_eq!(*snapshot, Value::Int(1));
/// assert_eq!(snapshot.version(), 2);
/// ```
#[derive(Debug)]
pub struct VersionedCell {
    state: RwLock<Snapshot>,
}

impl VersionedCell {
    /// Create a cell holding `initial` at version 1
    pub fn new(initial: Value) -> Self {
        Self {
            state: RwLock::new(Snapshot {
                value: Arc::new(initial),
                version: 1,
            }),
        }
    }

    /// Latest committed value
    pub fn read(&self) -> Arc<Value> {
        Arc::clone(&self.state.read().value)
    }

    /// Latest committed value with its version
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().clone()
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Install `new` iff the held snapshot is `expected` itself
    ///
    /// Deep-equal but distinct allocations do not match.
    pub fn compare_and_set(&self, expected: &Arc<Value>, new: Arc<Value>) -> bool {
        self.install_if(expected, new).is_some()
    }

    fn install_if(&self, expected: &Arc<Value>, new: Arc<Value>) -> Option<Snapshot> {
        let mut state = self.state.write();
        if !Arc::ptr_eq(&state.value, expected) {
            return None;
        }
        state.value = new;
        state.version += 1;
        Some(state.clone())
    }

    /// Apply `update` until the result lands, returning the installed snapshot
    ///
    /// `update` may run several times and must be a pure function of its
    /// input. Retries without bound.
    pub fn swap<F>(&self, mut update: F) -> Snapshot
    where
        F: FnMut(&Value) -> Value,
    {
        let mut retries = 0usize;
        loop {
            let previous = self.read();
            let next = Arc::new(update(&previous));
            if let Some(installed) = self.install_if(&previous, next) {
                return installed;
            }
            retries += 1;
            trace!(retries, "swap lost compare-and-set race, retrying");
            std::thread::yield_now();
        }
    }

    /// Apply a fallible update under a retry policy
    ///
    /// An `Err` from `update` aborts at once with nothing installed. A lost
    /// race reruns `update` against the fresh snapshot until
    /// `retry.max_retries` is spent. Returning the given `Arc` itself
    /// installs nothing and leaves the version unchanged.
    pub fn try_swap<E, F>(
        &self,
        retry: &RetryConfig,
        mut update: F,
    ) -> Result<SwapOutcome, SwapError<E>>
    where
        F: FnMut(&Arc<Value>) -> Result<Arc<Value>, E>,
    {
        let mut retries = 0usize;
        loop {
            let previous = self.snapshot();
            let next = update(&previous.value).map_err(SwapError::Aborted)?;

            if Arc::ptr_eq(&next, &previous.value) {
                return Ok(SwapOutcome {
                    current: previous.clone(),
                    previous,
                });
            }
            if let Some(current) = self.install_if(&previous.value, next) {
                return Ok(SwapOutcome { previous, current });
            }

            if !retry.allows_retry(retries) {
                debug!(attempts = retries + 1, "compare-and-set retries exhausted");
                return Err(SwapError::RetriesExhausted {
                    attempts: retries + 1,
                });
            }
            trace!(
                retries,
                seen_version = previous.version,
                "try_swap lost compare-and-set race, retrying"
            );
            retry.backoff(retries);
            retries += 1;
        }
    }

    /// Install `value` unconditionally
    pub fn reset(&self, value: Value) -> Snapshot {
        let mut state = self.state.write();
        state.value = Arc::new(value);
        state.version += 1;
        state.clone()
    }
}

impl Default for VersionedCell {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}
