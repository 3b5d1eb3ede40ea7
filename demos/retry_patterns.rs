//! Retry Patterns Example
//!
//! Demonstrates retrying blocking and async operations.
//! Shows practical patterns including:
//! - Basic retry with different backoff strategies
//! - Conditional retry (retry_if)
//! - Retry with observability hooks
//! - Cancelling a long backoff
//! - A simulated HTTP client
//!
//! Run with `cargo run --example retry_patterns --features tracing` to see the
//! retry loop's own debug events as well.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use steadfast::prelude::*;

// ==================== Basic Retry ====================

/// Example 1: Basic blocking retry with exponential backoff
///
/// Demonstrates retrying an operation that fails transiently.
fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let strategy =
        BackoffStrategy::exponential(Duration::from_millis(50), 2.0, Duration::from_secs(1));

    let mut attempts = 0;
    let outcome = retry(5, &strategy, || {
        attempts += 1;
        println!("  Attempt {}", attempts);
        if attempts < 3 {
            Err("transient failure")
        } else {
            Ok("success!")
        }
    });

    match outcome {
        RetryOutcome::Success {
            attempts_used,
            value,
        } => println!("Success after {} failures: {}", attempts_used, value),
        RetryOutcome::Failure { error } => println!("Gave up: {}", error),
    }
}

// ==================== Different Backoff Strategies ====================

/// Example 2: Comparing different backoff strategies
///
/// Shows how delay grows with each failed attempt.
fn example_backoff_strategies() {
    println!("\n=== Example 2: Backoff Strategies ===");

    let strategies = [
        (
            "Constant",
            BackoffStrategy::constant(Duration::from_millis(100)),
        ),
        (
            "Linear",
            BackoffStrategy::linear(
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(400),
            ),
        ),
        (
            "Exponential",
            BackoffStrategy::exponential(
                Duration::from_millis(100),
                2.0,
                Duration::from_millis(1000),
            ),
        ),
        (
            "Custom (squares)",
            BackoffStrategy::custom(|n| Duration::from_millis(10 * u64::from(n * n))),
        ),
    ];

    for (name, strategy) in &strategies {
        println!("{} delays:", name);
        for attempts in 1..=5 {
            println!("  After failure {}: {:?}", attempts, strategy.calculate_delay(attempts));
        }
    }

    let jittered = BackoffStrategy::constant(Duration::from_millis(100))
        .with_jitter(Duration::from_millis(50));
    println!("Constant 100ms with 50ms jitter:");
    for attempts in 1..=3 {
        println!("  After failure {}: {:?}", attempts, jittered.calculate_delay(attempts));
    }
}

// ==================== Conditional Retry ====================

/// Example 3: Retry only on specific errors
///
/// Demonstrates async_retry_if to distinguish transient from permanent errors.
async fn example_conditional_retry() {
    println!("\n=== Example 3: Conditional Retry ===");

    #[derive(Debug, Clone, PartialEq)]
    enum AppError {
        Transient(String),
        Permanent(String),
    }

    let strategy = BackoffStrategy::constant(Duration::from_millis(50));
    let attempts = AtomicU32::new(0);

    // Permanent errors are not retried
    let outcome: RetryOutcome<(), _> = async_retry_if(
        5,
        &strategy,
        |err: &AppError| matches!(err, AppError::Transient(_)),
        || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            println!("  Attempting...");
            Err(AppError::Permanent("invalid credentials".to_string()))
        },
    )
    .await;
    println!("Permanent error (no retries): {:?}", outcome);
    println!("Total attempts: {}", attempts.load(Ordering::SeqCst));

    attempts.store(0, Ordering::SeqCst);

    // Transient errors are retried until success
    let outcome = async_retry_if(
        5,
        &strategy,
        |err: &AppError| matches!(err, AppError::Transient(_)),
        || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            println!("  Attempt {}", n + 1);
            if n < 2 {
                Err(AppError::Transient("connection timeout".to_string()))
            } else {
                Ok("connected!")
            }
        },
    )
    .await;
    println!("\nTransient errors then success: {:?}", outcome);
    println!("Total attempts: {}", attempts.load(Ordering::SeqCst));
}

// ==================== Retry with Observability ====================

/// Example 4: Retry with hooks for logging/metrics
///
/// Demonstrates Retrier::on_retry for observability.
async fn example_retry_with_hooks() {
    println!("\n=== Example 4: Retry with Hooks ===");

    let retrier = Retrier::new(RetryConfig::new(
        5,
        BackoffStrategy::exponential(Duration::from_millis(25), 2.0, Duration::from_millis(500)),
    ))
    .on_retry(|event: &RetryEvent<'_, String>| {
        println!(
            "  [HOOK] Attempt {} failed with: {:?}",
            event.attempt, event.error
        );
        println!("         Waiting {:?} before retry...", event.delay);
        println!("         Total elapsed: {:?}", event.elapsed);
    });

    let attempts = AtomicU32::new(0);
    let outcome = retrier
        .run_async(|| async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 3 {
                Err(format!("error on attempt {}", n + 1))
            } else {
                Ok("finally succeeded!")
            }
        })
        .await;

    println!("\nOutcome: {:?}", outcome);
}

// ==================== Cancellation ====================

/// Example 5: Cancelling a retry loop stuck in a long backoff
async fn example_cancellation() {
    println!("\n=== Example 5: Cancellation ===");

    let retrier = Retrier::new(RetryConfig::new(
        10,
        BackoffStrategy::constant(Duration::from_secs(60)),
    ));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("  Shutting down, cancelling retries");
        canceller.cancel();
    });

    let result = retrier
        .run_async_cancellable(&token, || async { Err::<(), _>("service unavailable") })
        .await;

    match result {
        Ok(outcome) => println!("Finished: {:?}", outcome),
        Err(cancelled) => println!("Stopped early: {}", cancelled),
    }
}

// ==================== Real-World Pattern: HTTP Client ====================

/// Example 6: Simulated HTTP client with retry
///
/// Demonstrates a realistic pattern for API calls.
async fn example_http_pattern() {
    println!("\n=== Example 6: HTTP Client Pattern ===");

    // Simulated HTTP response
    #[derive(Debug, Clone)]
    enum HttpError {
        Timeout,
        ServerError(u16),
        ClientError(u16),
    }

    impl std::fmt::Display for HttpError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                HttpError::Timeout => write!(f, "request timed out"),
                HttpError::ServerError(code) => write!(f, "server error: {}", code),
                HttpError::ClientError(code) => write!(f, "client error: {}", code),
            }
        }
    }

    // Only retry on timeouts and server errors, not client errors
    fn is_retryable(err: &HttpError) -> bool {
        matches!(err, HttpError::Timeout | HttpError::ServerError(_))
    }

    let responses = Arc::new(AtomicU32::new(0));
    let fetch = {
        let responses = responses.clone();
        move || {
            let responses = responses.clone();
            async move {
                match responses.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(HttpError::Timeout),
                    1 => Err(HttpError::ServerError(503)),
                    _ => Ok(r#"{"status":"ok"}"#.to_string()),
                }
            }
        }
    };

    let strategy =
        BackoffStrategy::exponential(Duration::from_millis(50), 2.0, Duration::from_secs(2))
            .with_jitter(Duration::from_millis(20));

    match async_retry_if(4, &strategy, is_retryable, fetch).await {
        RetryOutcome::Success {
            attempts_used,
            value,
        } => println!("Got {} after {} failed requests", value, attempts_used),
        RetryOutcome::Failure { error } => println!("Request failed: {}", error),
    }

    let client_error: RetryOutcome<String, _> =
        async_retry_if(4, &strategy, is_retryable, || async {
            Err(HttpError::ClientError(404))
        })
        .await;
    println!("Client error is not retried: {:?}", client_error);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .init();

    println!("Retry Patterns Examples");
    println!("=======================");

    example_basic_retry();
    example_backoff_strategies();
    example_conditional_retry().await;
    example_retry_with_hooks().await;
    example_cancellation().await;
    example_http_pattern().await;

    println!("\n=== All examples completed ===");
}
