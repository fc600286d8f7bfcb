//! Error types for the engine layer

use optistore_concurrency::ConflictError;
use optistore_core::LimitError;
use std::path::PathBuf;

/// Error type for commits against a [`SystemStore`](crate::SystemStore)
///
/// Nothing is installed when a commit fails.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The proposal collided with changes committed since its baseline
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The commit validator refused the proposal
    #[error("commit rejected: {reason}")]
    Rejected {
        /// Reason given by the validator
        reason: String,
    },

    /// The proposal exceeds a structural limit
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// Every allowed attempt lost the compare-and-set race
    #[error("commit failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: usize,
    },

    /// `undo` was called with an empty history
    #[error("nothing to undo")]
    NothingToUndo,
}

impl CommitError {
    /// Whether rerunning the update against a fresh read may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommitError::Conflict(_) | CommitError::RetriesExhausted { .. }
        )
    }

    /// Create a rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        CommitError::Rejected {
            reason: reason.into(),
        }
    }
}

/// Error type for loading or saving a [`StoreConfig`](crate::StoreConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("config file '{}': {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The TOML text is malformed or has invalid fields
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
