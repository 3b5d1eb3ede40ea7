//! Backoff strategies: pure functions from a failure count to a delay.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait before the next attempt, given how many attempts have failed.
///
/// Strategies are pure data - they describe delays but never sleep. The only
/// side effect is the random jitter draw in [`calculate_delay`](Self::calculate_delay).
///
/// # Delay formulas
///
/// For `attempts` failed attempts so far (1-based):
///
/// - `Exponential`: `min(limit, base * exponent^(attempts - 1)) + jitter`
/// - `Linear`: `min(limit, base + increment * (attempts - 1)) + jitter`
/// - `Constant`: `base + jitter`
/// - `Custom`: whatever the function returns
///
/// Jitter is drawn uniformly from `[0, jitter)` and added *after* clamping, so a
/// jittered delay can exceed `limit`. A zero jitter range adds nothing.
///
/// # Examples
///
/// ```rust
/// use steadfast::BackoffStrategy;
/// use std::time::Duration;
///
/// let strategy = BackoffStrategy::exponential(
///     Duration::from_millis(100),
///     2.0,
///     Duration::from_secs(1),
/// );
///
/// assert_eq!(strategy.calculate_delay(1), Duration::from_millis(100));
/// assert_eq!(strategy.calculate_delay(2), Duration::from_millis(200));
/// assert_eq!(strategy.calculate_delay(3), Duration::from_millis(400));
/// assert_eq!(strategy.calculate_delay(5), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Delay grows geometrically by `exponent` per failure.
    Exponential {
        /// Delay after the first failure.
        base: Duration,
        /// Growth factor applied per additional failure.
        exponent: f64,
        /// Cap on the deterministic part of the delay.
        limit: Duration,
        /// Upper bound (exclusive) of the random delay added on top.
        jitter: Duration,
    },
    /// Delay grows by a fixed `increment` per failure.
    Linear {
        /// Delay after the first failure.
        base: Duration,
        /// Amount added per additional failure.
        increment: Duration,
        /// Cap on the deterministic part of the delay.
        limit: Duration,
        /// Upper bound (exclusive) of the random delay added on top.
        jitter: Duration,
    },
    /// Same delay after every failure.
    Constant {
        /// The delay.
        base: Duration,
        /// Upper bound (exclusive) of the random delay added on top.
        jitter: Duration,
    },
    /// Caller-supplied delay function.
    Custom(DelayFn),
}

/// A shareable delay function for [`BackoffStrategy::Custom`].
///
/// Two `DelayFn`s are equal only if they share the same allocation.
#[derive(Clone)]
pub struct DelayFn(Arc<dyn Fn(u32) -> Duration + Send + Sync>);

impl DelayFn {
    /// Wrap a function mapping the failure count to a delay.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function.
    pub fn call(&self, attempts: u32) -> Duration {
        (self.0)(attempts)
    }
}

impl fmt::Debug for DelayFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DelayFn(..)")
    }
}

impl PartialEq for DelayFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl BackoffStrategy {
    /// Exponential backoff without jitter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::BackoffStrategy;
    /// use std::time::Duration;
    ///
    /// let strategy = BackoffStrategy::exponential(
    ///     Duration::from_millis(50),
    ///     3.0,
    ///     Duration::from_secs(10),
    /// );
    ///
    /// // 50ms, 150ms, 450ms, ...
    /// assert_eq!(strategy.base_delay(3), Duration::from_millis(450));
    /// ```
    pub fn exponential(base: Duration, exponent: f64, limit: Duration) -> Self {
        Self::Exponential {
            base,
            exponent,
            limit,
            jitter: Duration::ZERO,
        }
    }

    /// Linear backoff without jitter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::BackoffStrategy;
    /// use std::time::Duration;
    ///
    /// let strategy = BackoffStrategy::linear(
    ///     Duration::from_millis(100),
    ///     Duration::from_millis(50),
    ///     Duration::from_millis(250),
    /// );
    ///
    /// assert_eq!(strategy.base_delay(1), Duration::from_millis(100));
    /// assert_eq!(strategy.base_delay(2), Duration::from_millis(150));
    /// assert_eq!(strategy.base_delay(5), Duration::from_millis(250)); // capped
    /// ```
    pub fn linear(base: Duration, increment: Duration, limit: Duration) -> Self {
        Self::Linear {
            base,
            increment,
            limit,
            jitter: Duration::ZERO,
        }
    }

    /// Constant delay without jitter.
    pub fn constant(base: Duration) -> Self {
        Self::Constant {
            base,
            jitter: Duration::ZERO,
        }
    }

    /// Delegate delay computation to `f`, called with the failure count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::BackoffStrategy;
    /// use std::time::Duration;
    ///
    /// let strategy =
    ///     BackoffStrategy::custom(|attempts| Duration::from_millis(10 * u64::from(attempts)));
    /// assert_eq!(strategy.calculate_delay(4), Duration::from_millis(40));
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self::Custom(DelayFn::new(f))
    }

    /// Set the jitter range. Has no effect on `Custom`.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, no jitter is drawn.
    pub fn with_jitter(mut self, range: Duration) -> Self {
        match &mut self {
            Self::Exponential { jitter, .. }
            | Self::Linear { jitter, .. }
            | Self::Constant { jitter, .. } => *jitter = range,
            Self::Custom(_) => {}
        }
        self
    }

    /// The configured jitter range (zero for `Custom`).
    pub fn jitter(&self) -> Duration {
        match self {
            Self::Exponential { jitter, .. }
            | Self::Linear { jitter, .. }
            | Self::Constant { jitter, .. } => *jitter,
            Self::Custom(_) => Duration::ZERO,
        }
    }

    /// The deterministic part of the delay after `attempts` failures.
    ///
    /// `attempts == 0` is treated as the first failure.
    pub fn base_delay(&self, attempts: u32) -> Duration {
        let step = attempts.saturating_sub(1);
        match self {
            Self::Exponential {
                base,
                exponent,
                limit,
                ..
            } => {
                let power = i32::try_from(step).unwrap_or(i32::MAX);
                let nanos = base.as_nanos() as f64 * exponent.powi(power);
                let grown = if nanos.is_finite() {
                    nanos_to_duration(nanos)
                } else {
                    *limit
                };
                grown.min(*limit)
            }
            Self::Linear {
                base,
                increment,
                limit,
                ..
            } => base
                .saturating_add(increment.saturating_mul(step))
                .min(*limit),
            Self::Constant { base, .. } => *base,
            Self::Custom(f) => f.call(attempts),
        }
    }

    /// The delay to wait after `attempts` failures, jitter included.
    pub fn calculate_delay(&self, attempts: u32) -> Duration {
        self.base_delay(attempts)
            .saturating_add(draw_jitter(self.jitter()))
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    if nanos > 0.0 {
        // `as` saturates at u64::MAX
        Duration::from_nanos(nanos.round() as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(feature = "jitter")]
fn draw_jitter(range: Duration) -> Duration {
    use rand::Rng;

    let max_nanos = u64::try_from(range.as_nanos()).unwrap_or(u64::MAX);
    if max_nanos == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(rand::rng().random_range(0..max_nanos))
    }
}

#[cfg(not(feature = "jitter"))]
fn draw_jitter(_range: Duration) -> Duration {
    Duration::ZERO
}
