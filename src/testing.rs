//! Testing utilities and helpers for code that retries
//!
//! This module provides a scripted flaky operation, assertion macros for
//! [`RetryOutcome`](crate::RetryOutcome), and property-based testing support.
//!
//! # Examples
//!
//! ## FlakyOperation
//!
//! ```rust
//! use steadfast::testing::FlakyOperation;
//! use steadfast::{retry, BackoffStrategy};
//! use std::time::Duration;
//!
//! let op = FlakyOperation::new(2, "timeout", "payload");
//! let outcome = retry(5, &BackoffStrategy::constant(Duration::ZERO), || op.call());
//!
//! assert_eq!(op.calls(), 3);
//! assert!(outcome.is_success());
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use steadfast::{assert_retry_failure, assert_retry_success, RetryOutcome};
//!
//! let success: RetryOutcome<_, String> = RetryOutcome::Success { attempts_used: 1, value: 42 };
//! assert_retry_success!(success);
//!
//! let failure: RetryOutcome<i32, _> = RetryOutcome::Failure { error: "boom" };
//! assert_retry_failure!(failure);
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

/// An operation that fails a fixed number of times, then succeeds.
///
/// Calls are counted atomically, so the same instance can be shared by
/// reference with blocking and async retry loops.
///
/// # Example
///
/// ```rust
/// use steadfast::testing::FlakyOperation;
///
/// let op = FlakyOperation::new(1, "busy", 7);
///
/// assert_eq!(op.call(), Err("busy"));
/// assert_eq!(op.call(), Ok(7));
/// assert_eq!(op.call(), Ok(7));
/// assert_eq!(op.calls(), 3);
/// ```
#[derive(Debug)]
pub struct FlakyOperation<T, E> {
    failures: u32,
    error: E,
    value: T,
    calls: AtomicU32,
}

impl<T: Clone, E: Clone> FlakyOperation<T, E> {
    /// Fail with `error` for the first `failures` calls, then return `value`.
    pub fn new(failures: u32, error: E, value: T) -> Self {
        Self {
            failures,
            error,
            value,
            calls: AtomicU32::new(0),
        }
    }

    /// An operation that never succeeds.
    pub fn always_failing(error: E, value: T) -> Self {
        Self::new(u32::MAX, error, value)
    }

    /// Run one attempt.
    pub fn call(&self) -> Result<T, E> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(self.error.clone())
        } else {
            Ok(self.value.clone())
        }
    }

    /// Run one attempt as a future.
    pub async fn call_async(&self) -> Result<T, E> {
        self.call()
    }

    /// How many times the operation has run.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Assert that a retry outcome is a success.
///
/// This macro will panic if the outcome is a `Failure`.
///
/// # Example
///
/// ```rust
/// use steadfast::{assert_retry_success, RetryOutcome};
///
/// let outcome: RetryOutcome<_, ()> = RetryOutcome::Success { attempts_used: 0, value: "ok" };
/// assert_retry_success!(outcome);
/// ```
#[macro_export]
macro_rules! assert_retry_success {
    ($outcome:expr) => {
        match $outcome {
            $crate::RetryOutcome::Success { .. } => {}
            $crate::RetryOutcome::Failure { error } => {
                panic!("Expected Success, got Failure: {:?}", error);
            }
        }
    };
    ($outcome:expr, attempts_used = $attempts:expr) => {
        match $outcome {
            $crate::RetryOutcome::Success { attempts_used, .. } => {
                assert_eq!(attempts_used, $attempts);
            }
            $crate::RetryOutcome::Failure { error } => {
                panic!("Expected Success, got Failure: {:?}", error);
            }
        }
    };
}

/// Assert that a retry outcome is a failure.
///
/// This macro will panic if the outcome is a `Success`.
///
/// # Example
///
/// ```rust
/// use steadfast::{assert_retry_failure, RetryOutcome};
///
/// let outcome: RetryOutcome<(), _> = RetryOutcome::Failure { error: "denied" };
/// assert_retry_failure!(outcome, "denied");
/// ```
#[macro_export]
macro_rules! assert_retry_failure {
    ($outcome:expr) => {
        match $outcome {
            $crate::RetryOutcome::Failure { .. } => {}
            $crate::RetryOutcome::Success { value, .. } => {
                panic!("Expected Failure, got Success: {:?}", value);
            }
        }
    };
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::RetryOutcome::Failure { error } => {
                assert_eq!(error, $expected);
            }
            $crate::RetryOutcome::Success { value, .. } => {
                panic!(
                    "Expected Failure with error {:?}, got Success: {:?}",
                    $expected, value
                );
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<T, E> Arbitrary for crate::RetryOutcome<T, E>
where
    T: Arbitrary + 'static,
    E: Arbitrary + 'static,
{
    type Parameters = (T::Parameters, E::Parameters);
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        let (t_params, e_params) = args;
        prop_oneof![
            (any::<u32>(), any_with::<T>(t_params)).prop_map(|(attempts_used, value)| {
                crate::RetryOutcome::Success {
                    attempts_used,
                    value,
                }
            }),
            any_with::<E>(e_params).prop_map(|error| crate::RetryOutcome::Failure { error }),
        ]
        .boxed()
    }
}

/// Generate non-custom backoff strategies with millisecond parameters below `max_ms`.
#[cfg(feature = "proptest")]
pub fn arb_backoff_strategy(max_ms: u64) -> BoxedStrategy<crate::BackoffStrategy> {
    use std::time::Duration;

    let ms = move || (0..max_ms).prop_map(Duration::from_millis);
    prop_oneof![
        (ms(), 1.0f64..4.0, ms(), ms()).prop_map(|(base, exponent, limit, jitter)| {
            crate::BackoffStrategy::exponential(base, exponent, limit).with_jitter(jitter)
        }),
        (ms(), ms(), ms(), ms()).prop_map(|(base, increment, limit, jitter)| {
            crate::BackoffStrategy::linear(base, increment, limit).with_jitter(jitter)
        }),
        (ms(), ms()).prop_map(|(base, jitter)| {
            crate::BackoffStrategy::constant(base).with_jitter(jitter)
        }),
    ]
    .boxed()
}
