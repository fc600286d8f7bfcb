//! Functional path access
//!
//! Helpers a domain layer uses to derive a proposed value from a baseline:
//! each update returns a new [`Value`] and leaves its input untouched.
//!
//! ```
//! use optistore_core::{access, Path, Value};
//! use serde_json::json;
//!
//! let library = Value::from(json!({"members": {}}));
//! let path: Path = r#"members["ann@example.org"]"#.parse().unwrap();
//!
//! let next = access::set_in(&library, &path, Value::from(json!({"name": "Ann"}))).unwrap();
//! assert!(access::has_in(&next, &path));
//! assert!(!access::has_in(&library, &path));
//! ```

use thiserror::Error;

use crate::limits::LimitError;
use crate::path::{Path, PathSegment};
use crate::value::Value;

/// Error type for path operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Type mismatch during path traversal
    #[error("type mismatch at {at}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Prefix of the path where traversal stopped
        at: Path,
        /// Expected type
        expected: &'static str,
        /// Actual type found
        found: &'static str,
    },

    /// Sequence index beyond the end (writes may only append at `len`)
    #[error("index out of bounds at {at}: {index} > {len}")]
    IndexOutOfBounds {
        /// Prefix of the path where traversal stopped
        at: Path,
        /// The requested index
        index: usize,
        /// The sequence length
        len: usize,
    },

    /// Path not found
    #[error("path not found: {0}")]
    NotFound(Path),

    /// Path longer than [`MAX_PATH_LENGTH`](crate::MAX_PATH_LENGTH)
    #[error(transparent)]
    Limit(#[from] LimitError),
}

/// Get the value at `path`, or `None` when any segment is missing
pub fn get_in<'a>(value: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Mapping(map)) => map.get(key)?,
            (PathSegment::Index(idx), Value::Sequence(items)) => items.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// True when something is stored at `path`
pub fn has_in(value: &Value, path: &Path) -> bool {
    get_in(value, path).is_some()
}

/// Return a copy of `root` with `new_value` stored at `path`
///
/// Missing intermediate containers are created; the kind (mapping or
/// sequence) follows the next segment. A sequence index may address an
/// existing element or append at exactly `len`.
pub fn set_in(root: &Value, path: &Path, new_value: Value) -> Result<Value, PathError> {
    let mut next = root.clone();
    *slot_mut(&mut next, path)? = new_value;
    Ok(next)
}

/// Return a copy of `root` with the value at `path` replaced by `f(old)`
///
/// `f` receives `None` when nothing is stored at `path` yet.
pub fn update_in<F>(root: &Value, path: &Path, f: F) -> Result<Value, PathError>
where
    F: FnOnce(Option<&Value>) -> Value,
{
    let new_value = f(get_in(root, path));
    set_in(root, path, new_value)
}

/// Return a copy of `root` without the value at `path`
///
/// Removing from a sequence shifts later elements down. Removing the root
/// yields `Null`.
pub fn remove_in(root: &Value, path: &Path) -> Result<Value, PathError> {
    path.validate()?;
    let Some(parent_path) = path.parent() else {
        return Ok(Value::Null);
    };
    if !has_in(root, path) {
        return Err(PathError::NotFound(path.clone()));
    }

    let mut next = root.clone();
    let parent = slot_mut(&mut next, &parent_path)?;
    match (path.last_segment(), parent) {
        (Some(PathSegment::Key(key)), Value::Mapping(map)) => {
            map.remove(key);
        }
        (Some(PathSegment::Index(idx)), Value::Sequence(items)) => {
            items.remove(*idx);
        }
        _ => return Err(PathError::NotFound(path.clone())),
    }
    Ok(next)
}

/// Walk to `path`, creating intermediate containers, and return its slot
fn slot_mut<'a>(root: &'a mut Value, path: &Path) -> Result<&'a mut Value, PathError> {
    path.validate()?;
    let segments = path.segments();
    let mut current = root;

    for (i, segment) in segments.iter().enumerate() {
        let at = || Path::from_segments(segments[..i].to_vec());
        let placeholder = match segments.get(i + 1) {
            Some(PathSegment::Index(_)) => Value::sequence(),
            _ => Value::mapping(),
        };

        current = match (segment, current) {
            (PathSegment::Key(key), Value::Mapping(map)) => {
                map.entry(key.clone()).or_insert(placeholder)
            }
            (PathSegment::Index(idx), Value::Sequence(items)) => {
                if *idx > items.len() {
                    return Err(PathError::IndexOutOfBounds {
                        at: at(),
                        index: *idx,
                        len: items.len(),
                    });
                }
                if *idx == items.len() {
                    items.push(placeholder);
                }
                &mut items[*idx]
            }
            (PathSegment::Key(_), other) => {
                return Err(PathError::TypeMismatch {
                    at: at(),
                    expected: "mapping",
                    found: other.type_name(),
                })
            }
            (PathSegment::Index(_), other) => {
                return Err(PathError::TypeMismatch {
                    at: at(),
                    expected: "sequence",
                    found: other.type_name(),
                })
            }
        };
    }

    Ok(current)
}
