//! Delay between verification probes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maps the number of probes already used to the wait before the next one.
///
/// Both variants are monotonic non-decreasing in the attempt number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackoffPolicy {
    /// Constant delay between probes
    Fixed {
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },
    /// `initial * multiplier^(attempt - 1)`, capped at `max`
    Exponential {
        #[serde(with = "humantime_serde")]
        initial: Duration,
        multiplier: f64,
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Fixed {
            delay: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// No waiting at all; useful for tests and dry local runs.
    pub fn none() -> Self {
        BackoffPolicy::Fixed {
            delay: Duration::ZERO,
        }
    }

    /// Delay after `attempts_used` probes (1-based).
    pub fn delay(&self, attempts_used: u32) -> Duration {
        match self {
            BackoffPolicy::Fixed { delay } => *delay,
            BackoffPolicy::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exponent = attempts_used.saturating_sub(1).min(i32::MAX as u32) as i32;
                let factor = multiplier.max(1.0).powi(exponent);
                Duration::try_from_secs_f64(initial.as_secs_f64() * factor)
                    .unwrap_or(*max)
                    .min(*max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = BackoffPolicy::Fixed {
            delay: Duration::from_secs(10),
        };
        assert_eq!(policy.delay(1), Duration::from_secs(10));
        assert_eq!(policy.delay(5), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_grows_and_caps() {
        let policy = BackoffPolicy::Exponential {
            initial: Duration::from_secs(1),
            multiplier: 2.0,
            max: Duration::from_secs(5),
        };
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
        assert_eq!(policy.delay(4), Duration::from_secs(5));
        assert_eq!(policy.delay(200), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_is_monotonic() {
        let policy = BackoffPolicy::Exponential {
            initial: Duration::from_millis(100),
            multiplier: 1.5,
            max: Duration::from_secs(30),
        };
        let delays: Vec<_> = (1..50).map(|n| policy.delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_policy_deserializes_from_toml() {
        let policy: BackoffPolicy = toml::from_str(
            r#"
            kind = "exponential"
            initial = "1s"
            multiplier = 3.0
            max = "1m"
            "#,
        )
        .unwrap();
        assert_eq!(policy.delay(2), Duration::from_secs(3));
    }
}
