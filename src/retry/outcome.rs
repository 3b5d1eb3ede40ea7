//! The result of a retry sequence.

/// How a retry sequence ended.
///
/// A sequence either succeeds, carrying the value and how many attempts failed
/// before it, or fails with the exact error that ended it - the last error once
/// attempts are exhausted, or the first error the retry predicate rejected.
///
/// # Examples
///
/// ```rust
/// use steadfast::{retry, BackoffStrategy, RetryOutcome};
/// use std::time::Duration;
///
/// let mut calls = 0;
/// let outcome = retry(3, &BackoffStrategy::constant(Duration::ZERO), || {
///     calls += 1;
///     if calls < 2 { Err("busy") } else { Ok(calls) }
/// });
///
/// assert_eq!(outcome, RetryOutcome::Success { attempts_used: 1, value: 2 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "a retry outcome may carry an error that should be handled"]
pub enum RetryOutcome<T, E> {
    /// The operation succeeded.
    Success {
        /// Number of failed attempts before the successful one.
        attempts_used: u32,
        /// The value produced by the successful attempt.
        value: T,
    },
    /// The sequence ended in failure.
    Failure {
        /// The error that ended the sequence.
        error: E,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Returns true for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true for `Failure`.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Failed attempts before success, or `None` for a failure.
    pub fn attempts_used(&self) -> Option<u32> {
        match self {
            Self::Success { attempts_used, .. } => Some(*attempts_used),
            Self::Failure { .. } => None,
        }
    }

    /// Borrow the success value.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// Borrow the terminal error.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Convert into a `Result`, discarding the attempt count.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure { error } => Err(error),
        }
    }

    /// Transform the success value.
    pub fn map<U, F>(self, f: F) -> RetryOutcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success {
                attempts_used,
                value,
            } => RetryOutcome::Success {
                attempts_used,
                value: f(value),
            },
            Self::Failure { error } => RetryOutcome::Failure { error },
        }
    }

    /// Transform the terminal error.
    pub fn map_err<E2, F>(self, f: F) -> RetryOutcome<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Success {
                attempts_used,
                value,
            } => RetryOutcome::Success {
                attempts_used,
                value,
            },
            Self::Failure { error } => RetryOutcome::Failure { error: f(error) },
        }
    }
}

impl<T, E> From<RetryOutcome<T, E>> for Result<T, E> {
    fn from(outcome: RetryOutcome<T, E>) -> Self {
        outcome.into_result()
    }
}
