//! Structural diff between two values
//!
//! [`diff`] computes a sparse [`Delta`] holding only what changed between two
//! values; [`apply`] deep-merges a delta back onto a value.
//!
//! # Invariants
//!
//! - `diff(v, v) == Delta::NoDiff` for every value
//! - `apply(a, &diff(a, b)) == b` for every pair of values
//! - Nested `Delta::Mapping` / `Delta::Sequence` nodes are never empty and
//!   never hold `NoDiff`; an unchanged container collapses to `NoDiff`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;

/// Sparse tree of changes between two values
///
/// Absence of a key (or index) in a nested node means "unchanged there".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    /// The two values were identical
    NoDiff,
    /// Whole-value replacement at this position
    Replace(Value),
    /// The key or index existed before and is gone now
    Remove,
    /// Per-key changes inside a mapping present on both sides
    Mapping(BTreeMap<String, Delta>),
    /// Per-index changes inside a sequence present on both sides
    Sequence(BTreeMap<usize, Delta>),
}

impl Delta {
    /// True for the identical-values marker
    pub fn is_no_diff(&self) -> bool {
        matches!(self, Delta::NoDiff)
    }
}

impl Default for Delta {
    fn default() -> Self {
        Delta::NoDiff
    }
}

/// Compute the structural delta that turns `old` into `new`
///
/// Two mappings (or two sequences) are compared child by child over the
/// union of their keys (indices). Anything else is a whole-value replacement
/// when the values differ. Total over all inputs: shape mismatches are
/// ordinary replacements, not errors.
///
/// # Examples
///
/// ```
/// use optistore_core::{apply, diff, Delta, Value};
/// use serde_json::json;
///
/// let old = Value::from(json!({"a": 1, "b": {"c": 2}}));
/// let new = Value::from(json!({"a": 1, "b": {"c": 3}}));
///
/// let delta = diff(&old, &new);
/// assert_eq!(apply(&old, &delta), new);
/// assert_eq!(diff(&old, &old), Delta::NoDiff);
/// ```
pub fn diff(old: &Value, new: &Value) -> Delta {
    match (old, new) {
        (Value::Mapping(a), Value::Mapping(b)) => diff_mappings(a, b),
        (Value::Sequence(a), Value::Sequence(b)) => diff_sequences(a, b),
        _ if old == new => Delta::NoDiff,
        _ => Delta::Replace(new.clone()),
    }
}

fn diff_mappings(old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> Delta {
    let mut changes = BTreeMap::new();

    for (key, old_child) in old {
        match new.get(key) {
            Some(new_child) => {
                let child = diff(old_child, new_child);
                if !child.is_no_diff() {
                    changes.insert(key.clone(), child);
                }
            }
            None => {
                changes.insert(key.clone(), Delta::Remove);
            }
        }
    }
    for (key, new_child) in new {
        if !old.contains_key(key) {
            changes.insert(key.clone(), Delta::Replace(new_child.clone()));
        }
    }

    if changes.is_empty() {
        Delta::NoDiff
    } else {
        Delta::Mapping(changes)
    }
}

fn diff_sequences(old: &[Value], new: &[Value]) -> Delta {
    let mut changes = BTreeMap::new();

    for (idx, (old_item, new_item)) in old.iter().zip(new.iter()).enumerate() {
        let child = diff(old_item, new_item);
        if !child.is_no_diff() {
            changes.insert(idx, child);
        }
    }
    for idx in new.len()..old.len() {
        changes.insert(idx, Delta::Remove);
    }
    for (idx, new_item) in new.iter().enumerate().skip(old.len()) {
        changes.insert(idx, Delta::Replace(new_item.clone()));
    }

    if changes.is_empty() {
        Delta::NoDiff
    } else {
        Delta::Sequence(changes)
    }
}

/// Deep-merge `delta` onto `base`, returning the merged value
///
/// Removals delete the key or index and nested changes recurse. A scalar
/// replacement overrides; a replacement container landing on a container of
/// the same kind is merged into it child by child, and overrides anything
/// else. `diff` only emits a replacement container where the old side had no
/// container of that kind, so round trips are unaffected. When a nested
/// change meets something that is not a container of the matching kind,
/// that position is reset to an empty container first. Sequence writes at or
/// past the end append, so appends still land after a concurrent
/// truncation; removals inside one sequence apply from the highest index
/// down.
pub fn apply(base: &Value, delta: &Delta) -> Value {
    let mut merged = base.clone();
    apply_in_place(&mut merged, delta);
    merged
}

/// In-place variant of [`apply`]
pub fn apply_in_place(target: &mut Value, delta: &Delta) {
    match delta {
        Delta::NoDiff => {}
        Delta::Replace(value) => merge_value(target, value),
        // Only reachable at the root; there is no parent to delete from
        Delta::Remove => *target = Value::Null,
        Delta::Mapping(changes) => {
            if !target.is_mapping() {
                *target = Value::mapping();
            }
            if let Value::Mapping(map) = target {
                for (key, change) in changes {
                    match change {
                        Delta::Remove => {
                            map.remove(key);
                        }
                        _ => {
                            let slot = map.entry(key.clone()).or_insert(Value::Null);
                            apply_in_place(slot, change);
                        }
                    }
                }
            }
        }
        Delta::Sequence(changes) => {
            if !target.is_sequence() {
                *target = Value::sequence();
            }
            if let Value::Sequence(items) = target {
                let mut removed = Vec::new();
                for (&idx, change) in changes {
                    if matches!(change, Delta::Remove) {
                        removed.push(idx);
                        continue;
                    }
                    if idx < items.len() {
                        apply_in_place(&mut items[idx], change);
                    } else {
                        let mut appended = Value::Null;
                        apply_in_place(&mut appended, change);
                        items.push(appended);
                    }
                }
                for idx in removed.into_iter().rev() {
                    if idx < items.len() {
                        items.remove(idx);
                    }
                }
            }
        }
    }
}

/// Merge a replacement value into `target`
fn merge_value(target: &mut Value, value: &Value) {
    match (target, value) {
        (Value::Mapping(map), Value::Mapping(incoming)) if !incoming.is_empty() => {
            for (key, child) in incoming {
                match map.get_mut(key) {
                    Some(slot) => merge_value(slot, child),
                    None => {
                        map.insert(key.clone(), child.clone());
                    }
                }
            }
        }
        (Value::Sequence(items), Value::Sequence(incoming)) if !incoming.is_empty() => {
            for (idx, child) in incoming.iter().enumerate() {
                match items.get_mut(idx) {
                    Some(slot) => merge_value(slot, child),
                    None => items.push(child.clone()),
                }
            }
        }
        (target, _) => *target = value.clone(),
    }
}
