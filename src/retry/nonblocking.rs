//! Async retry loop: awaits the operation and suspends the task between attempts
//! with a tokio timer, never blocking a thread.

use std::future::Future;
use std::time::Duration;

use futures::future::{select, Either};

use super::cancel::{CancellationToken, Cancelled};
use super::config::RetryConfig;
use super::event::RetryEvent;
use super::executor::{always_retry, ignore_event, Attempts, Step};
use super::outcome::RetryOutcome;
use super::retrier::Retrier;
use super::strategy::BackoffStrategy;

/// Await `operation` up to `max_attempts` times, suspending between failures
/// according to `strategy`.
///
/// Each attempt calls the factory for a fresh future; attempts never overlap.
/// `max_attempts` counts every run, including the first.
///
/// # Examples
///
/// ```rust
/// use steadfast::{async_retry, BackoffStrategy, RetryOutcome};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = AtomicU32::new(0);
/// let outcome = async_retry(3, &BackoffStrategy::constant(Duration::from_millis(1)), || async {
///     if calls.fetch_add(1, Ordering::SeqCst) == 0 {
///         Err("connection reset")
///     } else {
///         Ok(200)
///     }
/// })
/// .await;
///
/// assert_eq!(outcome, RetryOutcome::Success { attempts_used: 1, value: 200 });
/// # });
/// ```
pub async fn async_retry<T, E, F, Fut>(
    max_attempts: u32,
    strategy: &BackoffStrategy,
    operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    async_retry_if(max_attempts, strategy, always_retry::<E>, operation).await
}

/// Like [`async_retry`], but only retry errors for which `should_retry` returns true.
///
/// # Examples
///
/// ```rust
/// use steadfast::{async_retry_if, BackoffStrategy, RetryOutcome};
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq)]
/// enum ApiError { RateLimited, Unauthorized }
///
/// # tokio_test::block_on(async {
/// let outcome: RetryOutcome<(), _> = async_retry_if(
///     5,
///     &BackoffStrategy::constant(Duration::from_millis(1)),
///     |e: &ApiError| *e == ApiError::RateLimited,
///     || async { Err(ApiError::Unauthorized) },
/// )
/// .await;
///
/// assert_eq!(outcome, RetryOutcome::Failure { error: ApiError::Unauthorized });
/// # });
/// ```
pub async fn async_retry_if<T, E, P, F, Fut>(
    max_attempts: u32,
    strategy: &BackoffStrategy,
    should_retry: P,
    operation: F,
) -> RetryOutcome<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let config = RetryConfig::new(max_attempts, strategy.clone());
    let on_retry = ignore_event::<E>;
    let attempts = Attempts::start(&config, &should_retry, &on_retry);
    match drive(attempts, None, operation).await {
        Ok(outcome) => outcome,
        Err(cancelled) => unreachable!("{} without a cancellation token", cancelled),
    }
}

impl<E> Retrier<E> {
    /// Await `operation` with this retrier's rules.
    pub async fn run_async<T, F, Fut>(&self, operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = Attempts::start(self.config(), self.should_retry(), self.hook());
        match drive(attempts, None, operation).await {
            Ok(outcome) => outcome,
            Err(cancelled) => unreachable!("{} without a cancellation token", cancelled),
        }
    }

    /// Like [`run_async`](Self::run_async), but stop early once `token` is cancelled.
    ///
    /// Cancellation is observed before each attempt and during backoff delays.
    /// An attempt already in progress is awaited to completion; wrap the
    /// operation itself if it needs to be interruptible.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::{BackoffStrategy, CancellationToken, Cancelled, Retrier, RetryConfig};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let config = RetryConfig::new(10, BackoffStrategy::constant(Duration::from_secs(60)));
    /// let retrier = Retrier::new(config);
    /// let token = CancellationToken::new();
    ///
    /// let canceller = token.clone();
    /// tokio::spawn(async move {
    ///     tokio::time::sleep(Duration::from_millis(10)).await;
    ///     canceller.cancel();
    /// });
    ///
    /// let result = retrier
    ///     .run_async_cancellable(&token, || async { Err::<(), _>("offline") })
    ///     .await;
    ///
    /// assert_eq!(result, Err(Cancelled { attempts_used: 1 }));
    /// # });
    /// ```
    pub async fn run_async_cancellable<T, F, Fut>(
        &self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<RetryOutcome<T, E>, Cancelled>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = Attempts::start(self.config(), self.should_retry(), self.hook());
        drive(attempts, Some(token), operation).await
    }
}

async fn drive<T, E, P, H, F, Fut>(
    mut attempts: Attempts<'_, E, P, H>,
    token: Option<&CancellationToken>,
    mut operation: F,
) -> Result<RetryOutcome<T, E>, Cancelled>
where
    P: Fn(&E) -> bool + ?Sized,
    H: Fn(&RetryEvent<'_, E>) + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(attempts.cancelled());
        }

        let error = match operation().await {
            Ok(value) => return Ok(attempts.succeed(value)),
            Err(error) => error,
        };

        match attempts.fail(error) {
            Step::Fail(error) => return Ok(RetryOutcome::Failure { error }),
            Step::Delay(delay) => match token {
                Some(token) => {
                    if !sleep_unless_cancelled(token, delay).await {
                        return Err(attempts.cancelled());
                    }
                }
                None => tokio::time::sleep(delay).await,
            },
        }
    }
}

/// Returns `true` if the full delay elapsed.
async fn sleep_unless_cancelled(token: &CancellationToken, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    let cancelled = token.cancelled();
    futures::pin_mut!(sleep, cancelled);

    matches!(select(sleep, cancelled).await, Either::Left(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_async_retry_returns_value() {
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = async_retry(5, &BackoffStrategy::constant(Duration::from_millis(1)), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(n * 10)
                    }
                }
            }
        })
        .await;

        assert_eq!(
            outcome,
            RetryOutcome::Success {
                attempts_used: 2,
                value: 20
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_async_exhaustion_keeps_last_error() {
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), _> =
            async_retry(3, &BackoffStrategy::constant(Duration::ZERO), || async {
                Err(calls.fetch_add(1, Ordering::SeqCst))
            })
            .await;

        assert_eq!(outcome, RetryOutcome::Failure { error: 2 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_async_single_attempt() {
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), _> = async_retry_if(
            1,
            &BackoffStrategy::constant(Duration::from_secs(60)),
            |_: &&str| true,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            },
        )
        .await;

        assert_eq!(outcome, RetryOutcome::Failure { error: "boom" });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_predicate_rejects() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome: RetryOutcome<(), _> = async_retry_if(
            5,
            &BackoffStrategy::constant(Duration::from_secs(60)),
            |e: &&str| *e != "fatal",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            },
        )
        .await;

        assert_eq!(outcome, RetryOutcome::Failure { error: "fatal" });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retrier_run_async_with_hook() {
        let hook_calls = Arc::new(AtomicU32::new(0));
        let retrier = Retrier::new(RetryConfig::new(
            4,
            BackoffStrategy::constant(Duration::from_millis(1)),
        ))
        .on_retry({
            let hook_calls = hook_calls.clone();
            move |_: &RetryEvent<'_, String>| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let outcome: RetryOutcome<(), _> = retrier
            .run_async(|| async { Err("unavailable".to_string()) })
            .await;

        assert!(outcome.is_failure());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_async_delay() {
        let retrier = Retrier::new(RetryConfig::new(
            3,
            BackoffStrategy::constant(Duration::from_secs(60)),
        ));
        let token = CancellationToken::new();

        tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                token.cancel();
            }
        });

        let start = Instant::now();
        let result = retrier
            .run_async_cancellable(&token, || async { Err::<(), _>("down") })
            .await;

        assert_eq!(result, Err(Cancelled { attempts_used: 1 }));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_cancellable_async_success() {
        let retrier = Retrier::new(RetryConfig::new(
            2,
            BackoffStrategy::constant(Duration::ZERO),
        ));
        let token = CancellationToken::new();

        let result = retrier
            .run_async_cancellable(&token, || async { Ok::<_, ()>("ok") })
            .await;

        assert_eq!(
            result,
            Ok(RetryOutcome::Success {
                attempts_used: 0,
                value: "ok"
            })
        );
    }

    #[tokio::test]
    async fn test_async_retry_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let strategy = BackoffStrategy::constant(Duration::ZERO);
        let fut = async_retry(2, &strategy, || async { Ok::<_, ()>(1) });
        assert_send(&fut);
        assert!(fut.await.is_success());
    }
}
