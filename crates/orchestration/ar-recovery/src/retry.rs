//! Retry policy for archive downloads.
//!
//! Fixed, non-exponential backoff without jitter between a bounded number of
//! attempts.

use std::time::Duration;

/// Default number of download attempts per day.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default sleep between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep between two attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the sleep between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt follows the given (1-based) attempt.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
