//! A reusable retry configuration with a predicate and an observation hook.

use std::fmt;

use super::config::RetryConfig;
use super::event::RetryEvent;

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;
type Hook<E> = Box<dyn Fn(&RetryEvent<'_, E>) + Send + Sync>;

/// Runs operations under a [`RetryConfig`], optionally filtering which errors
/// are retried and observing each retry.
///
/// The free functions ([`retry`](crate::retry()), [`retry_if`](crate::retry_if),
/// and their async counterparts) cover one-off calls. A `Retrier` is for call
/// sites that reuse the same rules, attach hooks, or need cancellation.
///
/// # Examples
///
/// ```rust
/// use steadfast::{BackoffStrategy, Retrier, RetryConfig, RetryOutcome};
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq)]
/// enum FetchError { Timeout, NotFound }
///
/// let retrier = Retrier::new(RetryConfig::new(5, BackoffStrategy::constant(Duration::ZERO)))
///     .retry_if(|e: &FetchError| *e == FetchError::Timeout);
///
/// let outcome: RetryOutcome<(), _> = retrier.run(|| Err(FetchError::NotFound));
/// assert_eq!(outcome, RetryOutcome::Failure { error: FetchError::NotFound });
/// ```
pub struct Retrier<E> {
    config: RetryConfig,
    should_retry: Predicate<E>,
    on_retry: Hook<E>,
}

impl<E: 'static> Retrier<E> {
    /// Retry every error, with no hook.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            should_retry: Box::new(|_| true),
            on_retry: Box::new(|_| {}),
        }
    }

    /// Only retry errors for which `should_retry` returns true.
    ///
    /// A rejected error ends the sequence immediately with no delay.
    pub fn retry_if<P>(mut self, should_retry: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Box::new(should_retry);
        self
    }

    /// Call `hook` after each retryable failure, before the delay.
    ///
    /// The hook runs synchronously on the retrying thread or task and should
    /// not block; use it for logging and metrics.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::{BackoffStrategy, Retrier, RetryConfig, RetryEvent};
    /// use std::time::Duration;
    ///
    /// let retrier = Retrier::new(RetryConfig::new(3, BackoffStrategy::constant(Duration::ZERO)))
    ///     .on_retry(|event: &RetryEvent<'_, String>| {
    ///         eprintln!("attempt {} failed: {}", event.attempt, event.error);
    ///     });
    ///
    /// let outcome = retrier.run(|| Err::<(), _>("down".to_string()));
    /// assert!(outcome.is_failure());
    /// ```
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Box::new(hook);
        self
    }
}

impl<E> Retrier<E> {
    /// The config this retrier runs with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub(crate) fn should_retry(&self) -> &(dyn Fn(&E) -> bool + Send + Sync) {
        &*self.should_retry
    }

    pub(crate) fn hook(&self) -> &(dyn Fn(&RetryEvent<'_, E>) + Send + Sync) {
        &*self.on_retry
    }
}

impl<E> fmt::Debug for Retrier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
