//! Cancellation for long-running retry sequences.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A handle for aborting a retry sequence from another thread or task.
///
/// Clones share state: cancelling any clone cancels them all. Cancellation is
/// observed before each attempt and interrupts any in-progress backoff delay.
/// An attempt that is already running is not interrupted.
///
/// # Examples
///
/// ```rust
/// use steadfast::{BackoffStrategy, CancellationToken, Retrier, RetryConfig};
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let config = RetryConfig::new(5, BackoffStrategy::constant(Duration::from_secs(60)));
/// let retrier = Retrier::new(config);
/// let result = retrier.run_cancellable(&token, || Err::<(), _>("unreachable"));
///
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
    #[cfg(feature = "async")]
    notify: tokio::sync::Notify,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every sequence observing this token.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.condvar.notify_all();
        #[cfg(feature = "async")]
        self.inner.notify.notify_waiters();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Block the calling thread for `delay`, returning early if cancelled.
    ///
    /// Returns `true` if the full delay elapsed without cancellation.
    pub fn sleep(&self, delay: Duration) -> bool {
        let guard = self.lock();
        let (guard, _timeout) = self
            .inner
            .condvar
            .wait_timeout_while(guard, delay, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        !*guard
    }

    /// Complete once the token is cancelled.
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Error returned when a retry sequence is aborted through a [`CancellationToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cancelled {
    /// Failed attempts made before cancellation was observed.
    pub attempts_used: u32,
}

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "retry cancelled after {} failed attempts",
            self.attempts_used
        )
    }
}

impl std::error::Error for Cancelled {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_new_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_sleep_completes_without_cancel() {
        let token = CancellationToken::new();
        assert!(token.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn test_sleep_returns_immediately_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();

        let start = Instant::now();
        assert!(!token.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancel_wakes_sleeping_thread() {
        let token = CancellationToken::new();
        let sleeper = {
            let token = token.clone();
            std::thread::spawn(move || token.sleep(Duration::from_secs(30)))
        };

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(!sleeper.join().unwrap());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_cancelled_future_wakes() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("cancelled() should complete")
            .unwrap();
    }

    #[test]
    fn test_cancelled_display() {
        let err = Cancelled { attempts_used: 2 };
        assert_eq!(err.to_string(), "retry cancelled after 2 failed attempts");
    }
}
