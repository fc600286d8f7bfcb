//! Core types for optistore
//!
//! This crate defines the value model and the pure algorithms over it:
//! - Value: immutable tree of mappings, sequences and scalars
//! - Path / PathSegment / LeafPathSet: addressing inside a value
//! - Delta, diff, apply: structural diff and deep merge
//! - leaf_paths, disjoint, collisions: delta independence checks
//! - access: functional get/set/update/remove by path
//! - limits: nesting and path length bounds

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod analyzer;
pub mod delta;
pub mod limits;
pub mod path;
pub mod value;

pub use access::{get_in, has_in, remove_in, set_in, update_in, PathError};
pub use analyzer::{collide_sets, collisions, disjoint, leaf_paths};
pub use delta::{apply, apply_in_place, diff, Delta};
pub use limits::{LimitError, MAX_NESTING_DEPTH, MAX_PATH_LENGTH};
pub use path::{LeafPathSet, Path, PathParseError, PathSegment};
pub use value::Value;
