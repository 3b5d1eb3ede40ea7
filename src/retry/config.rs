//! Retry configuration: attempt budget plus backoff strategy.

use super::strategy::BackoffStrategy;

/// How many times to run an operation and how long to wait in between.
///
/// `max_attempts` counts every run of the operation, not just the retries:
/// `max_attempts = 3` means one initial attempt and up to two retries.
///
/// # Examples
///
/// ```rust
/// use steadfast::{BackoffStrategy, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::new(
///     4,
///     BackoffStrategy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(2)),
/// );
///
/// assert_eq!(config.max_attempts(), 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryConfig {
    max_attempts: u32,
    strategy: BackoffStrategy,
}

impl RetryConfig {
    /// Create a config.
    ///
    /// A `max_attempts` of zero is accepted here but runs as one attempt;
    /// use [`validate`](Self::validate) to reject it.
    pub fn new(max_attempts: u32, strategy: BackoffStrategy) -> Self {
        Self {
            max_attempts,
            strategy,
        }
    }

    /// The configured attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The attempt budget actually used when running, never below one.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The backoff strategy.
    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// Replace the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Replace the backoff strategy.
    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check that the config describes at least one attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            Err(ConfigError::ZeroAttempts)
        } else {
            Ok(())
        }
    }
}

/// Error returned by [`RetryConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_attempts` was zero.
    ZeroAttempts,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "max_attempts must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
