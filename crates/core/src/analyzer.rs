//! Leaf-path analysis of deltas
//!
//! Two deltas computed from the same baseline are independent when they do
//! not touch the same leaves. This module extracts the leaves a delta
//! touches and compares two deltas:
//!
//! - [`leaf_paths`]: every leaf path a delta writes
//! - [`disjoint`]: no leaf path in common
//! - [`collisions`]: leaf paths in common, paths where one delta writes inside
//!   a subtree the other one replaced or removed, and containers the two
//!   deltas build with different shapes

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::delta::Delta;
use crate::path::{LeafPathSet, Path, PathSegment};
use crate::value::Value;

/// Collect the full path of every leaf a delta touches
///
/// Nested change nodes are descended, and so is a replacement holding a
/// mapping or sequence: a newly added subtree touches each of its scalar
/// leaves. A removal, a scalar replacement, or a replacement by an empty
/// container is a leaf at its own path. `NoDiff` touches nothing.
///
/// # Examples
///
/// ```
/// use optistore_core::{diff, leaf_paths, Path, Value};
/// use serde_json::json;
///
/// let old = Value::from(json!({"a": 1, "b": {"c": 1}}));
/// let new = Value::from(json!({"a": 2, "b": {"c": 1, "d": {"e": 1}}}));
///
/// let paths: Vec<Path> = leaf_paths(&diff(&old, &new)).into_iter().collect();
/// assert_eq!(paths, vec!["a".parse().unwrap(), "b.d.e".parse().unwrap()]);
/// ```
pub fn leaf_paths(delta: &Delta) -> LeafPathSet {
    let mut leaves = LeafPathSet::new();
    let mut prefix = Path::root();
    collect_delta(delta, &mut prefix, &mut leaves);
    leaves
}

fn collect_delta(delta: &Delta, prefix: &mut Path, leaves: &mut LeafPathSet) {
    match delta {
        Delta::NoDiff => {}
        Delta::Remove => {
            leaves.insert(prefix.clone());
        }
        Delta::Replace(value) => collect_value(value, prefix, leaves),
        Delta::Mapping(changes) => {
            for (key, change) in changes {
                prefix.push(PathSegment::Key(key.clone()));
                collect_delta(change, prefix, leaves);
                prefix.pop();
            }
        }
        Delta::Sequence(changes) => {
            for (&idx, change) in changes {
                prefix.push(PathSegment::Index(idx));
                collect_delta(change, prefix, leaves);
                prefix.pop();
            }
        }
    }
}

fn collect_value(value: &Value, prefix: &mut Path, leaves: &mut LeafPathSet) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(PathSegment::Key(key.clone()));
                collect_value(child, prefix, leaves);
                prefix.pop();
            }
        }
        Value::Sequence(items) if !items.is_empty() => {
            for (idx, child) in items.iter().enumerate() {
                prefix.push(PathSegment::Index(idx));
                collect_value(child, prefix, leaves);
                prefix.pop();
            }
        }
        _ => {
            leaves.insert(prefix.clone());
        }
    }
}

/// True iff the two deltas share no leaf path
///
/// Symmetric. `NoDiff` is disjoint from everything.
pub fn disjoint(first: &Delta, second: &Delta) -> bool {
    leaf_paths(first).is_disjoint(&leaf_paths(second))
}

/// Leaf paths at which two deltas collide
///
/// Two leaf paths collide when they are equal or one is an ancestor of the
/// other; such a collision is reported once, by the shorter (ancestor) path.
/// Two deltas also collide at a container path when one addresses its
/// children by key and the other by index. Every path in
/// `leaf_paths(a) ∩ leaf_paths(b)` is in the result, so an empty result
/// implies [`disjoint`].
pub fn collisions(first: &Delta, second: &Delta) -> LeafPathSet {
    collide_sets(&leaf_paths(first), &leaf_paths(second))
}

/// [`collisions`] over already-collected leaf sets
pub fn collide_sets(first: &LeafPathSet, second: &LeafPathSet) -> LeafPathSet {
    let mut collided = LeafPathSet::new();
    if first.is_empty() || second.is_empty() {
        return collided;
    }
    scan_descendants(first, second, &mut collided);
    scan_descendants(second, first, &mut collided);
    scan_shapes(first, second, &mut collided);
    collided
}

/// For each path in `outer`, report it if `inner` holds it or a descendant
fn scan_descendants(outer: &LeafPathSet, inner: &LeafPathSet, collided: &mut LeafPathSet) {
    for path in outer {
        // Descendants of `path` sort contiguously right after it
        let hit = inner
            .range((Bound::Included(path), Bound::Unbounded))
            .next()
            .map_or(false, |candidate| path.is_ancestor_of(candidate));
        if hit {
            collided.insert(path.clone());
        }
    }
}

/// How a set of leaf paths addresses the children of a container path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Mapping,
    Sequence,
}

fn container_shapes(leaves: &LeafPathSet) -> BTreeMap<Path, Shape> {
    let mut shapes = BTreeMap::new();
    for leaf in leaves {
        let mut prefix = Path::root();
        for segment in leaf.segments() {
            let shape = match segment {
                PathSegment::Key(_) => Shape::Mapping,
                PathSegment::Index(_) => Shape::Sequence,
            };
            shapes.entry(prefix.clone()).or_insert(shape);
            prefix.push(segment.clone());
        }
    }
    shapes
}

/// Report containers one side builds as a mapping and the other as a sequence
fn scan_shapes(first: &LeafPathSet, second: &LeafPathSet, collided: &mut LeafPathSet) {
    let theirs = container_shapes(second);
    for (path, shape) in container_shapes(first) {
        if theirs.get(&path).map_or(false, |other| *other != shape) {
            collided.insert(path);
        }
    }
}
