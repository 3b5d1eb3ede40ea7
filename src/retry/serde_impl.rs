//! Serde support for [`BackoffStrategy`] when the `serde` feature is enabled.
//!
//! Durations are written as integer milliseconds and the variant as a `kind` tag.
//! Serializing a duration with sub-millisecond precision is an error.
//!
//!
//! ```rust
//! use steadfast::{BackoffStrategy, RetryConfig};
//! use std::time::Duration;
//!
//! let json = r#"{
//!     "max_attempts": 3,
//!     "strategy": { "kind": "linear", "base_ms": 100, "increment_ms": 50, "limit_ms": 500 }
//! }"#;
//!
//! let config: RetryConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(config.strategy().base_delay(2), Duration::from_millis(150));
//! ```
//!
//! `Custom` strategies hold a function and cannot be serialized.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

use super::strategy::BackoffStrategy;

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StrategyRepr {
    Exponential {
        base_ms: u64,
        exponent: f64,
        limit_ms: u64,
        #[serde(default)]
        jitter_ms: u64,
    },
    Linear {
        base_ms: u64,
        increment_ms: u64,
        limit_ms: u64,
        #[serde(default)]
        jitter_ms: u64,
    },
    Constant {
        base_ms: u64,
        #[serde(default)]
        jitter_ms: u64,
    },
}

fn to_ms<E: serde::ser::Error>(d: Duration) -> Result<u64, E> {
    if d.subsec_nanos() % 1_000_000 != 0 {
        return Err(E::custom(format!("{d:?} cannot be written as whole milliseconds")));
    }
    Ok(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl Serialize for BackoffStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Self::Exponential {
                base,
                exponent,
                limit,
                jitter,
            } => StrategyRepr::Exponential {
                base_ms: to_ms::<S::Error>(*base)?,
                exponent: *exponent,
                limit_ms: to_ms::<S::Error>(*limit)?,
                jitter_ms: to_ms::<S::Error>(*jitter)?,
            },
            Self::Linear {
                base,
                increment,
                limit,
                jitter,
            } => StrategyRepr::Linear {
                base_ms: to_ms::<S::Error>(*base)?,
                increment_ms: to_ms::<S::Error>(*increment)?,
                limit_ms: to_ms::<S::Error>(*limit)?,
                jitter_ms: to_ms::<S::Error>(*jitter)?,
            },
            Self::Constant { base, jitter } => StrategyRepr::Constant {
                base_ms: to_ms::<S::Error>(*base)?,
                jitter_ms: to_ms::<S::Error>(*jitter)?,
            },
            Self::Custom(_) => {
                return Err(serde::ser::Error::custom(
                    "custom backoff strategies cannot be serialized",
                ))
            }
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BackoffStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let strategy = match StrategyRepr::deserialize(deserializer)? {
            StrategyRepr::Exponential {
                base_ms,
                exponent,
                limit_ms,
                jitter_ms,
            } => Self::exponential(
                Duration::from_millis(base_ms),
                exponent,
                Duration::from_millis(limit_ms),
            )
            .with_jitter(Duration::from_millis(jitter_ms)),
            StrategyRepr::Linear {
                base_ms,
                increment_ms,
                limit_ms,
                jitter_ms,
            } => Self::linear(
                Duration::from_millis(base_ms),
                Duration::from_millis(increment_ms),
                Duration::from_millis(limit_ms),
            )
            .with_jitter(Duration::from_millis(jitter_ms)),
            StrategyRepr::Constant { base_ms, jitter_ms } => {
                Self::constant(Duration::from_millis(base_ms))
                    .with_jitter(Duration::from_millis(jitter_ms))
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryConfig;

    #[test]
    fn test_serialize_exponential() {
        let strategy = BackoffStrategy::exponential(
            Duration::from_millis(100),
            2.0,
            Duration::from_millis(1000),
        );

        let json = serde_json::to_string(&strategy).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"exponential","base_ms":100,"exponent":2.0,"limit_ms":1000,"jitter_ms":0}"#
        );
    }

    #[test]
    fn test_deserialize_constant_with_jitter() {
        let json = r#"{"kind":"constant","base_ms":50,"jitter_ms":10}"#;
        let strategy: BackoffStrategy = serde_json::from_str(json).unwrap();

        assert_eq!(
            strategy,
            BackoffStrategy::constant(Duration::from_millis(50))
                .with_jitter(Duration::from_millis(10))
        );
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{"max_attempts":5,"strategy":{"kind":"constant","base_ms":20}}"#;
        let config: RetryConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.strategy().jitter(), Duration::ZERO);
    }

    #[test]
    fn test_unknown_kind_fails() {
        let json = r#"{"kind":"fibonacci","base_ms":20}"#;
        let result: Result<BackoffStrategy, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_keeps_jitter() {
        let strategy = BackoffStrategy::linear(
            Duration::from_millis(15),
            Duration::from_millis(5),
            Duration::from_secs(2),
        )
        .with_jitter(Duration::from_millis(9));

        let json = serde_json::to_string(&strategy).unwrap();
        let back: BackoffStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strategy);
    }

    #[test]
    fn test_sub_millisecond_durations_are_rejected() {
        let strategy = BackoffStrategy::constant(Duration::from_micros(1500))
            .with_jitter(Duration::from_micros(900));

        let err = serde_json::to_string(&strategy).unwrap_err().to_string();
        assert!(err.contains("whole milliseconds"));

        let jitter_only = BackoffStrategy::constant(Duration::from_millis(2))
            .with_jitter(Duration::from_micros(900));
        assert!(serde_json::to_string(&jitter_only).is_err());
    }

    #[test]
    fn test_custom_cannot_be_serialized() {
        let strategy = BackoffStrategy::custom(|_| Duration::ZERO);
        let err = serde_json::to_string(&strategy).unwrap_err().to_string();
        assert!(err.contains("custom backoff"));
    }
}
