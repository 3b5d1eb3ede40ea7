//! Blocking retry loop: runs the operation on the calling thread and sleeps it
//! between attempts.

use super::cancel::{CancellationToken, Cancelled};
use super::config::RetryConfig;
use super::event::RetryEvent;
use super::executor::{always_retry, ignore_event, Attempts, Step};
use super::outcome::RetryOutcome;
use super::retrier::Retrier;
use super::strategy::BackoffStrategy;

/// Run `operation` up to `max_attempts` times, sleeping the calling thread
/// between failures according to `strategy`.
///
/// `max_attempts` counts every run, including the first. Returns as soon as the
/// operation succeeds or the last permitted attempt fails; no delay follows the
/// final attempt. A `max_attempts` of zero runs the operation once.
///
/// # Examples
///
/// ```rust
/// use steadfast::{retry, BackoffStrategy, RetryOutcome};
/// use std::time::Duration;
///
/// let mut calls = 0;
/// let strategy = BackoffStrategy::constant(Duration::from_millis(1));
/// let outcome: RetryOutcome<(), &str> = retry(3, &strategy, || {
///     calls += 1;
///     Err("disk busy")
/// });
///
/// assert_eq!(outcome, RetryOutcome::Failure { error: "disk busy" });
/// assert_eq!(calls, 3);
/// ```
pub fn retry<T, E, F>(
    max_attempts: u32,
    strategy: &BackoffStrategy,
    operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    retry_if(max_attempts, strategy, always_retry::<E>, operation)
}

/// Like [`retry`], but only retry errors for which `should_retry` returns true.
///
/// The first rejected error ends the sequence immediately, without a delay.
///
/// # Examples
///
/// ```rust
/// use steadfast::{retry_if, BackoffStrategy, RetryOutcome};
/// use std::io::{Error, ErrorKind};
/// use std::time::Duration;
///
/// let mut calls = 0;
/// let outcome: RetryOutcome<(), Error> = retry_if(
///     5,
///     &BackoffStrategy::constant(Duration::from_millis(1)),
///     |e: &Error| e.kind() == ErrorKind::Interrupted,
///     || {
///         calls += 1;
///         Err(Error::from(ErrorKind::PermissionDenied))
///     },
/// );
///
/// assert_eq!(outcome.error().map(Error::kind), Some(ErrorKind::PermissionDenied));
/// assert_eq!(calls, 1);
/// ```
pub fn retry_if<T, E, P, F>(
    max_attempts: u32,
    strategy: &BackoffStrategy,
    should_retry: P,
    operation: F,
) -> RetryOutcome<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Result<T, E>,
{
    let config = RetryConfig::new(max_attempts, strategy.clone());
    let on_retry = ignore_event::<E>;
    let attempts = Attempts::start(&config, &should_retry, &on_retry);
    uncancellable(drive(attempts, None, operation))
}

impl<E> Retrier<E> {
    /// Run `operation` with this retrier's rules, blocking the calling thread.
    pub fn run<T, F>(&self, operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let attempts = Attempts::start(self.config(), self.should_retry(), self.hook());
        uncancellable(drive(attempts, None, operation))
    }

    /// Like [`run`](Self::run), but stop early once `token` is cancelled.
    ///
    /// The token is checked before every attempt and wakes the thread out of a
    /// backoff delay. An attempt already in progress runs to completion.
    pub fn run_cancellable<T, F>(
        &self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<RetryOutcome<T, E>, Cancelled>
    where
        F: FnMut() -> Result<T, E>,
    {
        let attempts = Attempts::start(self.config(), self.should_retry(), self.hook());
        drive(attempts, Some(token), operation)
    }
}

fn drive<T, E, P, H, F>(
    mut attempts: Attempts<'_, E, P, H>,
    token: Option<&CancellationToken>,
    mut operation: F,
) -> Result<RetryOutcome<T, E>, Cancelled>
where
    P: Fn(&E) -> bool + ?Sized,
    H: Fn(&RetryEvent<'_, E>) + ?Sized,
    F: FnMut() -> Result<T, E>,
{
    loop {
        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(attempts.cancelled());
        }

        let error = match operation() {
            Ok(value) => return Ok(attempts.succeed(value)),
            Err(error) => error,
        };

        match attempts.fail(error) {
            Step::Fail(error) => return Ok(RetryOutcome::Failure { error }),
            Step::Delay(delay) => match token {
                Some(token) => {
                    if !token.sleep(delay) {
                        return Err(attempts.cancelled());
                    }
                }
                None => std::thread::sleep(delay),
            },
        }
    }
}

fn uncancellable<T, E>(result: Result<RetryOutcome<T, E>, Cancelled>) -> RetryOutcome<T, E> {
    match result {
        Ok(outcome) => outcome,
        Err(cancelled) => unreachable!("{} without a cancellation token", cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// A constant zero-delay strategy that counts how many delays were computed.
    fn counting_strategy() -> (BackoffStrategy, Arc<AtomicU32>) {
        let delays = Arc::new(AtomicU32::new(0));
        let strategy = BackoffStrategy::custom({
            let delays = delays.clone();
            move |_| {
                delays.fetch_add(1, Ordering::SeqCst);
                Duration::ZERO
            }
        });
        (strategy, delays)
    }

    #[test]
    fn test_single_attempt_runs_once() {
        let (strategy, delays) = counting_strategy();
        let mut calls = 0;

        let outcome: RetryOutcome<(), _> = retry(1, &strategy, || {
            calls += 1;
            Err("boom")
        });

        assert_eq!(outcome, RetryOutcome::Failure { error: "boom" });
        assert_eq!(calls, 1);
        assert_eq!(delays.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_always_failing_runs_max_attempts() {
        let (strategy, delays) = counting_strategy();
        let mut calls = 0;

        let outcome: RetryOutcome<(), _> = retry(4, &strategy, || {
            calls += 1;
            Err(calls)
        });

        assert_eq!(outcome, RetryOutcome::Failure { error: 4 });
        assert_eq!(calls, 4);
        assert_eq!(delays.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_success_after_failures() {
        let (strategy, delays) = counting_strategy();
        let mut calls = 0;

        let outcome = retry(5, &strategy, || {
            calls += 1;
            if calls < 3 {
                Err("transient")
            } else {
                Ok("done")
            }
        });

        assert_eq!(
            outcome,
            RetryOutcome::Success {
                attempts_used: 2,
                value: "done"
            }
        );
        assert_eq!(calls, 3);
        assert_eq!(delays.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_predicate_rejection_stops_immediately() {
        let (strategy, delays) = counting_strategy();
        let mut calls = 0;

        let outcome: RetryOutcome<(), _> = retry_if(
            10,
            &strategy,
            |_: &&str| false,
            || {
                calls += 1;
                Err("permanent")
            },
        );

        assert_eq!(outcome, RetryOutcome::Failure { error: "permanent" });
        assert_eq!(calls, 1);
        assert_eq!(delays.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predicate_stops_on_first_rejected_error() {
        let mut calls = 0;

        let outcome: RetryOutcome<(), _> = retry_if(
            10,
            &BackoffStrategy::constant(Duration::ZERO),
            |e: &u32| *e < 3,
            || {
                calls += 1;
                Err(calls)
            },
        );

        assert_eq!(outcome, RetryOutcome::Failure { error: 3 });
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_repeated_success_is_stable() {
        let strategy = BackoffStrategy::constant(Duration::from_millis(1));

        for _ in 0..2 {
            let outcome = retry(3, &strategy, || Ok::<_, ()>(()));
            assert_eq!(
                outcome,
                RetryOutcome::Success {
                    attempts_used: 0,
                    value: ()
                }
            );
        }
    }

    #[test]
    fn test_sleeps_between_attempts() {
        let strategy = BackoffStrategy::constant(Duration::from_millis(20));
        let start = Instant::now();

        let outcome: RetryOutcome<(), _> = retry(3, &strategy, || Err(()));

        assert!(outcome.is_failure());
        // two delays, none after the final attempt
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_retrier_hook_and_predicate() {
        let hook_calls = Arc::new(AtomicU32::new(0));
        let retrier = Retrier::new(RetryConfig::new(
            5,
            BackoffStrategy::constant(Duration::ZERO),
        ))
        .retry_if(|e: &&str| *e == "flaky")
        .on_retry({
            let hook_calls = hook_calls.clone();
            move |event: &RetryEvent<'_, &str>| {
                assert_eq!(*event.error, "flaky");
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let mut calls = 0;
        let outcome: RetryOutcome<(), _> = retrier.run(|| {
            calls += 1;
            if calls < 3 {
                Err("flaky")
            } else {
                Err("fatal")
            }
        });

        assert_eq!(outcome, RetryOutcome::Failure { error: "fatal" });
        assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let retrier = Retrier::new(RetryConfig::new(
            3,
            BackoffStrategy::constant(Duration::ZERO),
        ));
        let token = CancellationToken::new();
        token.cancel();

        let mut calls = 0;
        let result = retrier.run_cancellable(&token, || {
            calls += 1;
            Ok::<_, ()>(())
        });

        assert_eq!(result, Err(Cancelled { attempts_used: 0 }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_cancel_interrupts_delay() {
        let retrier = Retrier::new(RetryConfig::new(
            3,
            BackoffStrategy::constant(Duration::from_secs(60)),
        ));
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                token.cancel();
            })
        };

        let start = Instant::now();
        let result = retrier.run_cancellable(&token, || Err::<(), _>("down"));
        canceller.join().unwrap();

        assert_eq!(result, Err(Cancelled { attempts_used: 1 }));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_cancellable_run_completes_normally() {
        let retrier = Retrier::new(RetryConfig::new(
            3,
            BackoffStrategy::constant(Duration::ZERO),
        ));
        let token = CancellationToken::new();

        let result = retrier.run_cancellable(&token, || Ok::<_, ()>(5));

        assert_eq!(
            result,
            Ok(RetryOutcome::Success {
                attempts_used: 0,
                value: 5
            })
        );
    }
}
