//! Attempt bookkeeping shared by the blocking and async retry loops.
//!
//! A retry sequence moves through four states: running an attempt, delaying
//! before the next one, succeeded, or failed. The loops own the running and
//! delaying; [`Attempts`] decides every transition out of a finished attempt so
//! both loops follow exactly the same rules.

use std::time::{Duration, Instant};

use super::cancel::Cancelled;
use super::config::RetryConfig;
use super::event::RetryEvent;
use super::outcome::RetryOutcome;

/// What to do after a failed attempt.
#[derive(Debug)]
pub(crate) enum Step<E> {
    /// Wait, then run the operation again.
    Delay(Duration),
    /// Stop with this error.
    Fail(E),
}

/// Tracks failures for one retry sequence.
pub(crate) struct Attempts<'a, E, P: ?Sized, H: ?Sized> {
    config: &'a RetryConfig,
    should_retry: &'a P,
    on_retry: &'a H,
    failures: u32,
    started: Instant,
    _error: std::marker::PhantomData<fn(&E)>,
}

impl<'a, E, P, H> Attempts<'a, E, P, H>
where
    P: Fn(&E) -> bool + ?Sized,
    H: Fn(&RetryEvent<'_, E>) + ?Sized,
{
    pub(crate) fn start(config: &'a RetryConfig, should_retry: &'a P, on_retry: &'a H) -> Self {
        Self {
            config,
            should_retry,
            on_retry,
            failures: 0,
            started: Instant::now(),
            _error: std::marker::PhantomData,
        }
    }

    /// The attempt succeeded; no further attempts or delays.
    pub(crate) fn succeed<T>(&self, value: T) -> RetryOutcome<T, E> {
        #[cfg(feature = "tracing")]
        tracing::trace!(attempts_used = self.failures, "retry sequence succeeded");

        RetryOutcome::Success {
            attempts_used: self.failures,
            value,
        }
    }

    /// The attempt failed. Either stop with the error, or count the failure and
    /// report how long to wait before the next attempt.
    ///
    /// The last permitted attempt never yields a delay.
    pub(crate) fn fail(&mut self, error: E) -> Step<E> {
        let max_attempts = self.config.effective_max_attempts();
        let retryable = (self.should_retry)(&error);

        if !retryable || self.failures.saturating_add(1) >= max_attempts {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = self.failures + 1,
                retryable,
                "retry sequence failed"
            );
            return Step::Fail(error);
        }

        self.failures += 1;
        let delay = self.config.strategy().calculate_delay(self.failures);

        (self.on_retry)(&RetryEvent {
            attempt: self.failures,
            error: &error,
            delay,
            elapsed: self.started.elapsed(),
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = self.failures,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "attempt failed, retrying"
        );

        Step::Delay(delay)
    }

    pub(crate) fn cancelled(&self) -> Cancelled {
        #[cfg(feature = "tracing")]
        tracing::debug!(attempts_used = self.failures, "retry sequence cancelled");

        Cancelled {
            attempts_used: self.failures,
        }
    }
}

pub(crate) fn always_retry<E>(_: &E) -> bool {
    true
}

pub(crate) fn ignore_event<E>(_: &RetryEvent<'_, E>) {}
