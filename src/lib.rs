//! # Steadfast
//!
//! > *"Try, wait, try again"*
//!
//! A Rust library for retrying fallible operations with backoff.
//!
//! ## Philosophy
//!
//! **Steadfast** keeps the **pure core, imperative shell** split:
//! - Backoff strategies are pure data: a failure count goes in, a delay comes out
//! - Retry loops are the shell: they run the operation, sleep, and stop
//!
//! Nothing is logged, wrapped, or swallowed. Every sequence ends in a
//! [`RetryOutcome`] carrying either the value or the exact error that ended it.
//!
//! ## Quick Example
//!
//! ```rust
//! use steadfast::{retry_if, BackoffStrategy, RetryOutcome};
//! use std::time::Duration;
//!
//! #[derive(Debug, PartialEq)]
//! enum SaveError {
//!     Locked,
//!     Corrupt,
//! }
//!
//! let strategy = BackoffStrategy::linear(
//!     Duration::from_millis(1),
//!     Duration::from_millis(1),
//!     Duration::from_millis(5),
//! );
//!
//! let mut attempts = 0;
//! let outcome = retry_if(
//!     4,
//!     &strategy,
//!     |e: &SaveError| *e == SaveError::Locked,
//!     || {
//!         attempts += 1;
//!         match attempts {
//!             1 | 2 => Err(SaveError::Locked),
//!             _ => Ok(attempts),
//!         }
//!     },
//! );
//!
//! match outcome {
//!     RetryOutcome::Success { attempts_used, value } => {
//!         println!("saved on attempt {} after {} failures", value, attempts_used);
//!     }
//!     RetryOutcome::Failure { error } => {
//!         println!("gave up: {:?}", error);
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - `async` (default): `async_retry` and the async [`Retrier`] runners on tokio
//! - `jitter` (default): random jitter via `rand`
//! - `tracing`: `debug`/`trace` events from the retry loop
//! - `serde`: (de)serialize [`RetryConfig`] and [`BackoffStrategy`]
//! - `proptest`: `Arbitrary` strategies for property tests

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;
pub mod testing;

// Re-exports
#[cfg(feature = "async")]
pub use retry::{async_retry, async_retry_if};
pub use retry::{
    retry, retry_if, BackoffStrategy, CancellationToken, Cancelled, ConfigError, DelayFn,
    Retrier, RetryConfig, RetryEvent, RetryOutcome,
};

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "async")]
    pub use crate::retry::{async_retry, async_retry_if};
    pub use crate::retry::{
        retry, retry_if, BackoffStrategy, CancellationToken, Cancelled, Retrier, RetryConfig,
        RetryEvent, RetryOutcome,
    };
}
