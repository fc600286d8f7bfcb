//! Engine layer for optistore
//!
//! This crate provides the store façade applications talk to:
//! - SystemStore: read, commit, transact, undo, reset
//! - StoreConfig: TOML-loadable settings (retry, history, limits, policy)
//! - CommitValidator: proposal checks run before reconciliation
//! - CommitError / ConfigError: engine error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod store;
pub mod validate;

pub use config::{ConflictPolicy, StoreConfig};
pub use error::{CommitError, ConfigError};
pub use store::SystemStore;
pub use validate::{AcceptAll, CommitValidator};
