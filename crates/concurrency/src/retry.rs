//! Retry policy for compare-and-set loops
//!
//! Contains RetryConfig for the cell's swap loop and related utilities.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for compare-and-set retry behavior
///
/// A lost compare-and-set race is retried automatically; this controls how
/// often and how patiently. The default retries without bound and without
/// sleeping, yielding the thread between attempts.
///
/// # Example
/// ```
/// use optistore_concurrency::RetryConfig;
///
/// let config = RetryConfig::new()
///     .with_max_retries(5)
///     .with_base_delay_us(10)
///     .with_max_delay_us(200);
/// assert_eq!(config.max_retries, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (`None` = unbounded, `Some(0)` = no retries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
    /// Base delay between retries in microseconds (exponential backoff)
    pub base_delay_us: u64,
    /// Maximum delay between retries in microseconds
    pub max_delay_us: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            base_delay_us: 0,
            max_delay_us: 1_000,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: Some(0),
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Retry without bound
    pub fn unbounded(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_us(mut self, base_delay_us: u64) -> Self {
        self.base_delay_us = base_delay_us;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_us(mut self, max_delay_us: u64) -> Self {
        self.max_delay_us = max_delay_us;
        self
    }

    /// Whether another attempt is allowed after `retries` retries
    pub fn allows_retry(&self, retries: usize) -> bool {
        self.max_retries.map_or(true, |max| retries < max)
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_us = self.base_delay_us.saturating_mul(multiplier);
        Duration::from_micros(delay_us.min(self.max_delay_us))
    }

    /// Pause before retry number `attempt`
    ///
    /// Yields the thread instead of sleeping when the delay is zero.
    pub fn backoff(&self, attempt: usize) {
        let delay = self.calculate_delay(attempt);
        if delay.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(delay);
        }
    }
}
