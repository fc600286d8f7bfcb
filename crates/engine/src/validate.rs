//! Commit validation hook
//!
//! A validator sees the baseline a writer started from and the value it
//! proposes, before any reconciliation happens. Returning `Err(reason)`
//! rejects the commit and nothing is installed.

use optistore_core::Value;

/// Checks a proposal before it is committed
///
/// Closures `Fn(&Value, &Value) -> Result<(), String>` implement this trait.
pub trait CommitValidator: Send + Sync {
    /// Accept or reject `proposed`, derived from `baseline`
    fn validate(&self, baseline: &Value, proposed: &Value) -> Result<(), String>;
}

/// Validator that accepts every proposal
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CommitValidator for AcceptAll {
    fn validate(&self, _baseline: &Value, _proposed: &Value) -> Result<(), String> {
        Ok(())
    }
}

impl<F> CommitValidator for F
where
    F: Fn(&Value, &Value) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, baseline: &Value, proposed: &Value) -> Result<(), String> {
        self(baseline, proposed)
    }
}
