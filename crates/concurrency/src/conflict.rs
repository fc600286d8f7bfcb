//! Conflict resolution for optimistic commits
//!
//! A writer reads a `baseline`, derives a `proposed` value from it, and asks
//! to install it. By then the store may hold a `current` value that other
//! writers advanced past the baseline. A [`ConflictResolver`] decides what
//! to install instead of `proposed`, or refuses.
//!
//! # Resolution Outcomes
//!
//! - **FastForward**: nobody committed since the baseline was read; install
//!   `proposed` as is
//! - **Unchanged**: the proposal changes nothing; keep `current`
//! - **Merged**: concurrent and proposed changes touch independent leaves;
//!   install `current` with the proposed changes folded in
//! - **Conflict**: both sides touched the same leaves, one edited inside a
//!   subtree the other replaced, or they built one container with different
//!   shapes; nothing is installed

use optistore_core::{apply, collide_sets, diff, leaf_paths, LeafPathSet, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for commit-time conflicts
///
/// Distinct from a lost compare-and-set race, which the cell retries
/// internally. A conflict is permanent for this `(baseline, proposed)` pair;
/// the caller must read again and build a new proposal.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictError {
    /// Concurrent and proposed changes touched overlapping leaf paths
    #[error("concurrent mutation at {}", DisplayPaths(.paths))]
    ConcurrentMutation {
        /// The contested paths (ancestor path when one contains the other)
        paths: LeafPathSet,
    },
    /// The baseline is stale and the resolver does not merge
    #[error("stale baseline: concurrently changed at {}", DisplayPaths(.paths))]
    StaleBaseline {
        /// Leaf paths other writers changed since the baseline
        paths: LeafPathSet,
    },
}

impl ConflictError {
    /// The paths named by this conflict
    pub fn paths(&self) -> &LeafPathSet {
        match self {
            ConflictError::ConcurrentMutation { paths } => paths,
            ConflictError::StaleBaseline { paths } => paths,
        }
    }
}

struct DisplayPaths<'a>(&'a LeafPathSet);

impl fmt::Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path)?;
        }
        f.write_str("]")
    }
}

/// Outcome of a successful resolution
///
/// `FastForward` and `Unchanged` carry no value so the caller can install
/// the snapshot it already holds instead of a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Install `proposed` unchanged
    FastForward,
    /// Keep `current`; the proposal is a no-op
    Unchanged,
    /// Install this merged value
    Merged(Value),
}

impl Resolution {
    /// Materialize the value to install
    pub fn into_value(self, current: &Value, proposed: &Value) -> Value {
        match self {
            Resolution::FastForward => proposed.clone(),
            Resolution::Unchanged => current.clone(),
            Resolution::Merged(value) => value,
        }
    }
}

/// Decides what a commit installs given the live value
///
/// Called once per compare-and-set attempt, so it must be a pure function
/// of its inputs.
pub trait ConflictResolver: Send + Sync {
    /// Reconcile `proposed` (derived from `baseline`) with `current`
    fn resolve(
        &self,
        current: &Value,
        baseline: &Value,
        proposed: &Value,
    ) -> Result<Resolution, ConflictError>;

    /// Reconcile and return the value to install
    fn reconcile(
        &self,
        current: &Value,
        baseline: &Value,
        proposed: &Value,
    ) -> Result<Value, ConflictError> {
        Ok(self
            .resolve(current, baseline, proposed)?
            .into_value(current, proposed))
    }
}

/// Three-way structural merge
///
/// Diffs baseline→current and baseline→proposed and folds the proposed
/// delta onto `current` when the two do not collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWayMerge;

impl ConflictResolver for ThreeWayMerge {
    fn resolve(
        &self,
        current: &Value,
        baseline: &Value,
        proposed: &Value,
    ) -> Result<Resolution, ConflictError> {
        if current == baseline {
            return Ok(Resolution::FastForward);
        }

        let ours = diff(baseline, proposed);
        if ours.is_no_diff() {
            return Ok(Resolution::Unchanged);
        }
        let theirs = diff(baseline, current);

        let paths = collide_sets(&leaf_paths(&theirs), &leaf_paths(&ours));
        if !paths.is_empty() {
            return Err(ConflictError::ConcurrentMutation { paths });
        }
        Ok(Resolution::Merged(apply(current, &ours)))
    }
}

/// Abort whenever anything was committed since the baseline
///
/// Only fast-forwards. Useful when proposals carry cross-field invariants a
/// leaf-level merge could break.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictAbort;

impl ConflictResolver for StrictAbort {
    fn resolve(
        &self,
        current: &Value,
        baseline: &Value,
        _proposed: &Value,
    ) -> Result<Resolution, ConflictError> {
        if current == baseline {
            return Ok(Resolution::FastForward);
        }
        Err(ConflictError::StaleBaseline {
            paths: leaf_paths(&diff(baseline, current)),
        })
    }
}

/// Reconcile with the default [`ThreeWayMerge`] resolver
///
/// # Examples
///
/// ```
/// use optistore_concurrency::reconcile;
/// use optistore_core::Value;
/// use serde_json::json;
///
/// let baseline = Value::from(json!({"a": 1, "b": 1}));
/// let current = Value::from(json!({"a": 2, "b": 1}));
/// let proposed = Value::from(json!({"a": 1, "b": 2}));
///
/// let merged = reconcile(&current, &baseline, &proposed).unwrap();
/// assert_eq!(merged, Value::from(json!({"a": 2, "b": 2})));
/// ```
pub fn reconcile(
    current: &Value,
    baseline: &Value,
    proposed: &Value,
) -> Result<Value, ConflictError> {
    ThreeWayMerge.reconcile(current, baseline, proposed)
}
