//! SystemStore: optimistic commits over one shared value
//!
//! ## Commit Protocol
//!
//! 1. Caller reads a snapshot (the baseline) and derives a proposal from it
//! 2. `commit(baseline, proposed)` validates the proposal
//! 3. The cell's swap loop reconciles the proposal with the live value and
//!    installs the result; a lost race reconciles again against the winner
//! 4. A conflict aborts the loop and nothing is installed
//!
//! Commits that changed the value are recorded for [`SystemStore::undo`].

use optistore_concurrency::{ConflictError, ConflictResolver, Resolution, Snapshot, SwapError, VersionedCell};
use optistore_core::Value;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::CommitError;
use crate::validate::{AcceptAll, CommitValidator};

/// One installed commit, kept for undo
#[derive(Debug, Clone)]
struct CommitRecord {
    /// Version the commit was installed at
    version: u64,
    before: Arc<Value>,
    after: Arc<Value>,
}

/// Undo history, ordered by installed version
///
/// Committers record after their compare-and-set lands, so records can
/// arrive out of order; they are placed by version, not arrival.
#[derive(Debug, Default)]
struct History {
    records: VecDeque<CommitRecord>,
    /// Records at or below this version predate the last reset
    floor: u64,
}

impl History {
    fn insert(&mut self, entry: CommitRecord, depth: usize) {
        if depth == 0 || entry.version <= self.floor {
            return;
        }
        let at = self
            .records
            .iter()
            .rposition(|r| r.version < entry.version)
            .map_or(0, |i| i + 1);
        self.records.insert(at, entry);
        while self.records.len() > depth {
            self.records.pop_front();
        }
    }

    fn pop_latest(&mut self) -> Option<CommitRecord> {
        self.records.pop_back()
    }

    fn clear(&mut self, floor: u64) {
        self.records.clear();
        self.floor = floor;
    }
}

/// Store façade over a [`VersionedCell`]
///
/// # Example
///
/// ```
/// use optistore_core::{set_in, Path, Value};
/// use optistore_engine::SystemStore;
///
/// let store = SystemStore::new(Value::mapping());
///
/// let baseline = store.read();
/// let proposed = set_in(&baseline, &Path::root().key("books"), Value::Int(1)).unwrap();
/// store.commit(&baseline, proposed).unwrap();
///
/// assert_eq!(store.read().as_mapping().unwrap()["books"], Value::Int(1));
/// ```
pub struct SystemStore {
    cell: VersionedCell,
    resolver: Box<dyn ConflictResolver>,
    validator: Box<dyn CommitValidator>,
    config: StoreConfig,
    history: Mutex<History>,
}

impl SystemStore {
    /// Create a store with the default configuration
    pub fn new(initial: Value) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    /// Create a store from a configuration
    ///
    /// The resolver follows `config.conflict_policy`. `initial` is trusted:
    /// use [`try_with_config`](Self::try_with_config) for values from outside.
    pub fn with_config(initial: Value, config: StoreConfig) -> Self {
        Self {
            cell: VersionedCell::new(initial),
            resolver: config.conflict_policy.resolver(),
            validator: Box::new(AcceptAll),
            config,
            history: Mutex::new(History::default()),
        }
    }

    /// Create a store from a configuration, checking `initial` against
    /// `config.max_nesting_depth`
    pub fn try_with_config(initial: Value, config: StoreConfig) -> Result<Self, CommitError> {
        initial.validate_depth(config.max_nesting_depth)?;
        Ok(Self::with_config(initial, config))
    }

    /// Replace the conflict resolver (builder pattern)
    pub fn with_resolver(mut self, resolver: impl ConflictResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the commit validator (builder pattern)
    pub fn with_validator(mut self, validator: impl CommitValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========== Read Operations ==========

    /// Latest committed value
    pub fn read(&self) -> Arc<Value> {
        self.cell.read()
    }

    /// Latest committed value with its version
    pub fn snapshot(&self) -> Snapshot {
        self.cell.snapshot()
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Number of commits available to undo
    pub fn history_len(&self) -> usize {
        self.history.lock().records.len()
    }

    // ========== Write Operations ==========

    /// Commit `proposed`, derived from `baseline`
    ///
    /// Returns the snapshot installed (or kept, for a no-op proposal).
    ///
    /// # Errors
    ///
    /// - `Rejected` if the validator refuses the proposal
    /// - `Limit` if the proposal nests too deeply
    /// - `Conflict` if the proposal collides with concurrent commits
    /// - `RetriesExhausted` if a retry cap is configured and every attempt
    ///   lost the compare-and-set race
    pub fn commit(&self, baseline: &Value, proposed: Value) -> Result<Snapshot, CommitError> {
        self.commit_inner(baseline, proposed, true)
    }

    fn commit_inner(
        &self,
        baseline: &Value,
        proposed: Value,
        record: bool,
    ) -> Result<Snapshot, CommitError> {
        if let Err(reason) = self.validator.validate(baseline, &proposed) {
            debug!(%reason, "Commit rejected by validator");
            return Err(CommitError::Rejected { reason });
        }
        proposed.validate_depth(self.config.max_nesting_depth)?;

        let proposed = Arc::new(proposed);
        let mut outcome_kind = "fast-forward";
        let swapped = self.cell.try_swap(&self.config.retry, |current| {
            // The caller's baseline is the live snapshot itself
            if std::ptr::eq(current.as_ref(), baseline) {
                outcome_kind = "fast-forward";
                return Ok::<_, ConflictError>(Arc::clone(&proposed));
            }
            match self.resolver.resolve(current, baseline, &proposed)? {
                Resolution::FastForward => {
                    outcome_kind = "fast-forward";
                    Ok(Arc::clone(&proposed))
                }
                Resolution::Unchanged => {
                    outcome_kind = "unchanged";
                    Ok(Arc::clone(current))
                }
                Resolution::Merged(value) => {
                    outcome_kind = "merged";
                    Ok(Arc::new(value))
                }
            }
        });

        let outcome = match swapped {
            Ok(outcome) => outcome,
            Err(SwapError::Aborted(conflict)) => {
                warn!(error = %conflict, "Commit conflicted");
                return Err(conflict.into());
            }
            Err(SwapError::RetriesExhausted { attempts }) => {
                warn!(attempts, "Commit gave up after losing every compare-and-set race");
                return Err(CommitError::RetriesExhausted { attempts });
            }
        };

        debug!(
            outcome = outcome_kind,
            version = outcome.current.version(),
            "Commit applied"
        );

        if record && outcome.installed() && *outcome.previous != *outcome.current {
            self.record(CommitRecord {
                version: outcome.current.version(),
                before: outcome.previous.into_value(),
                after: Arc::clone(outcome.current.value()),
            });
        }
        Ok(outcome.current)
    }

    fn record(&self, entry: CommitRecord) {
        self.history
            .lock()
            .insert(entry, self.config.history_depth);
    }

    /// Read, derive a proposal with `f`, and commit it
    ///
    /// After a conflict `f` runs again against a fresh read, up to
    /// `transact_retries` more times. Errors from `f` are returned as is.
    pub fn transact<F>(&self, f: F) -> Result<Snapshot, CommitError>
    where
        F: Fn(&Value) -> Result<Value, CommitError>,
    {
        let mut attempt = 0usize;
        loop {
            let baseline = self.read();
            let proposed = f(&baseline)?;
            match self.commit(&baseline, proposed) {
                Err(e) if e.is_conflict() && attempt < self.config.transact_retries => {
                    debug!(attempt, error = %e, "Transact retrying after conflict");
                    self.config.retry.backoff(attempt);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Replace the value unconditionally and forget the history
    ///
    /// Like [`with_config`](Self::with_config), `value` is trusted.
    pub fn reset(&self, value: Value) -> Snapshot {
        let snapshot = self.cell.reset(value);
        self.history.lock().clear(snapshot.version());
        debug!(version = snapshot.version(), "Store reset");
        snapshot
    }

    /// Revert the recorded commit with the highest version
    ///
    /// The revert is itself reconciled against the live value, so later
    /// independent commits survive it. If a later commit touched the same
    /// paths the undo fails with a conflict and the record goes back to its
    /// place in the history.
    pub fn undo(&self) -> Result<Snapshot, CommitError> {
        let entry = self
            .history
            .lock()
            .pop_latest()
            .ok_or(CommitError::NothingToUndo)?;

        match self.commit_inner(&entry.after, (*entry.before).clone(), false) {
            Ok(snapshot) => {
                debug!(undone = entry.version, "Commit undone");
                Ok(snapshot)
            }
            Err(e) => {
                self.record(entry);
                Err(e)
            }
        }
    }
}

impl fmt::Debug for SystemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemStore")
            .field("version", &self.version())
            .field("history_len", &self.history_len())
            .field("config", &self.config)
            .finish()
    }
}
