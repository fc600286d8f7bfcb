//! Store configuration via TOML
//!
//! A [`StoreConfig`] can be built in code, parsed from a TOML string, or
//! loaded from a file. Every field has a default, so an empty file is a
//! valid config.

use optistore_concurrency::{ConflictResolver, RetryConfig, StrictAbort, ThreeWayMerge};
use optistore_core::MAX_NESTING_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// How a commit against a stale baseline is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Merge independent changes, conflict on overlapping ones
    #[default]
    ThreeWayMerge,
    /// Conflict on any change committed since the baseline
    StrictAbort,
}

impl ConflictPolicy {
    /// Build the resolver implementing this policy
    pub fn resolver(self) -> Box<dyn ConflictResolver> {
        match self {
            ConflictPolicy::ThreeWayMerge => Box::new(ThreeWayMerge),
            ConflictPolicy::StrictAbort => Box::new(StrictAbort),
        }
    }
}

/// Store configuration
///
/// # Example
///
/// ```toml
/// conflict_policy = "three-way-merge"
/// history_depth = 16
///
/// [retry]
/// max_retries = 100
/// base_delay_us = 1
/// max_delay_us = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Extra attempts `transact` makes after a conflict
    pub transact_retries: usize,
    /// Number of commits kept for `undo` (0 disables history)
    pub history_depth: usize,
    /// Maximum nesting depth of a proposed value
    pub max_nesting_depth: usize,
    /// Resolver used by stores built from this config
    pub conflict_policy: ConflictPolicy,
    /// Retry policy for lost compare-and-set races inside one commit
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            transact_retries: 8,
            history_depth: 16,
            max_nesting_depth: MAX_NESTING_DEPTH,
            conflict_policy: ConflictPolicy::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Set the compare-and-set retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set how many times `transact` reruns after a conflict
    pub fn with_transact_retries(mut self, retries: usize) -> Self {
        self.transact_retries = retries;
        self
    }

    /// Set the undo history depth
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Set the maximum nesting depth of proposals
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the conflict policy
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# optistore configuration
#
# Conflict policy: "three-way-merge" (default) or "strict-abort"
#   "three-way-merge" = fold independent concurrent changes together
#   "strict-abort"    = refuse any commit whose baseline is stale
conflict_policy = "three-way-merge"

# Extra attempts `transact` makes after a conflict (default: 8)
transact_retries = 8

# Commits remembered for undo; 0 disables history (default: 16)
history_depth = 16

# Maximum nesting depth of a committed value (default: 100)
max_nesting_depth = 100

# Compare-and-set retry policy.
# Omit max_retries to retry without bound.
[retry]
# max_retries = 1000
base_delay_us = 0
max_delay_us = 1000
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
