//! SystemStore Integration Tests
//!
//! End-to-end commit scenarios against the public `optistore` API.

#[path = "../common/mod.rs"]
mod common;

mod config;
mod contention;
mod merge_scenarios;
mod undo;
