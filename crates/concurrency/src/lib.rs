//! Concurrency layer for optistore
//!
//! This crate implements optimistic commits over a single shared value:
//! - VersionedCell: snapshot cell with compare-and-set and retrying swap
//! - ConflictResolver: three-way merge (or strict abort) of a proposal
//!   against whatever other writers committed since its baseline
//! - RetryConfig: retry bound and backoff for lost compare-and-set races

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod conflict;
pub mod retry;

pub use cell::{Snapshot, SwapError, SwapOutcome, VersionedCell};
pub use conflict::{reconcile, ConflictError, ConflictResolver, Resolution, StrictAbort, ThreeWayMerge};
pub use retry::RetryConfig;
