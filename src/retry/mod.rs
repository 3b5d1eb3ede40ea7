//! Retry with backoff for fallible operations.
//!
//! This module follows the "pure core, imperative shell" split:
//!
//! - **Pure Core**: [`BackoffStrategy`] is just data - a function from the number
//!   of failed attempts to a delay, with no side effects beyond the jitter draw
//! - **Imperative Shell**: the retry loops run the operation, sleep, and decide
//!   when to stop
//!
//! # Quick Start
//!
//! ```rust
//! use steadfast::{retry, BackoffStrategy, RetryOutcome};
//! use std::time::Duration;
//!
//! let strategy = BackoffStrategy::exponential(
//!     Duration::from_millis(1),
//!     2.0,
//!     Duration::from_millis(10),
//! );
//!
//! let mut calls = 0;
//! let outcome = retry(5, &strategy, || {
//!     calls += 1;
//!     if calls < 3 { Err("not yet") } else { Ok("ready") }
//! });
//!
//! assert_eq!(outcome, RetryOutcome::Success { attempts_used: 2, value: "ready" });
//! ```
//!
//! # Backoff Strategies
//!
//! - **Exponential**: `base * exponent^(n-1)`, capped at `limit`
//! - **Linear**: `base + increment * (n-1)`, capped at `limit`
//! - **Constant**: `base` every time
//! - **Custom**: any `Fn(u32) -> Duration`
//!
//! # Jitter Support
//!
//! Jitter adds a uniformly random `[0, range)` delay on top of the strategy's
//! delay so that many callers failing together do not retry in lockstep.
//! It is enabled by the default `jitter` feature:
//!
//! ```rust
//! use steadfast::BackoffStrategy;
//! use std::time::Duration;
//!
//! let strategy = BackoffStrategy::constant(Duration::from_millis(100))
//!     .with_jitter(Duration::from_millis(25));
//!
//! let delay = strategy.calculate_delay(1);
//! assert!(delay >= Duration::from_millis(100) && delay < Duration::from_millis(125));
//! ```
//!
//! # Execution
//!
//! - [`retry`](crate::retry()) / [`retry_if`]: block the calling thread
//! - `async_retry` / `async_retry_if`: suspend the task on a tokio timer
//!   (requires the `async` feature)
//! - [`Retrier`]: reusable rules with hooks and [`CancellationToken`] support
//!
//! # Error Types
//!
//! - [`RetryOutcome::Failure`]: carries the operation's own error, untouched
//! - [`Cancelled`]: returned only by the cancellable runners
//! - [`ConfigError`]: returned by [`RetryConfig::validate`]

mod blocking;
mod cancel;
mod config;
mod event;
mod executor;
#[cfg(feature = "async")]
mod nonblocking;
mod outcome;
mod retrier;
#[cfg(feature = "serde")]
mod serde_impl;
mod strategy;

pub use blocking::{retry, retry_if};
pub use cancel::{CancellationToken, Cancelled};
pub use config::{ConfigError, RetryConfig};
pub use event::RetryEvent;
#[cfg(feature = "async")]
pub use nonblocking::{async_retry, async_retry_if};
pub use outcome::RetryOutcome;
pub use retrier::Retrier;
pub use strategy::{BackoffStrategy, DelayFn};
