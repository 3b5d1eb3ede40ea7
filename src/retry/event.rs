//! Observation events for retry hooks.

use std::time::Duration;

/// Information about a failed attempt that is about to be retried.
///
/// Passed to hooks registered with [`Retrier::on_retry`](crate::Retrier::on_retry).
/// Hooks see only retryable failures; the failure that ends a sequence is
/// delivered through the outcome instead.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Failed attempts so far, including this one (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt.
    pub delay: Duration,
    /// Total elapsed time since the first attempt started.
    pub elapsed: Duration,
}
