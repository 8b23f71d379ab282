//! Exponential reconnect backoff.
//!
//! After an unintentional disconnect the controller waits before trying
//! again, doubling the wait each time up to a ceiling:
//!
//! ```text
//! attempt:  0     1     2     3     4      5      6 ...
//! delay:    1s    2s    4s    8s    16s    30s    30s
//! ```
//!
//! The arithmetic saturates, so very large attempt counts simply stay at
//! the ceiling instead of overflowing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters of the reconnect delay curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect attempt.
    pub initial: Duration,
    /// Growth factor applied per attempt.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    /// 1 s initial delay, doubling, capped at 30 s.
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            multiplier: 2,
            max: Duration::from_millis(30_000),
        }
    }
}

impl BackoffPolicy {
    /// Returns `min(initial × multiplier^attempt, max)`.
    ///
    /// A multiplier of 0 is treated as 1, so the curve never decreases.
    pub fn delay(&self, attempt: u32) -> Duration {
        let initial_ms = self.initial.as_millis().min(u64::MAX as u128) as u64;
        let max_ms = self.max.as_millis().min(u64::MAX as u128) as u64;

        let factor = (self.multiplier.max(1) as u64)
            .checked_pow(attempt)
            .unwrap_or(u64::MAX);
        let delay_ms = initial_ms.saturating_mul(factor).min(max_ms);

        Duration::from_millis(delay_ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_matches_documented_points() {
        // Arrange
        let policy = BackoffPolicy::default();

        // Act / Assert
        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(1), Duration::from_millis(2000));
        assert_eq!(policy.delay(4), Duration::from_millis(16_000));
        assert_eq!(policy.delay(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_delay_is_monotonically_non_decreasing() {
        let policy = BackoffPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..64 {
            let d = policy.delay(attempt);
            assert!(d >= previous, "delay({attempt}) decreased");
            assert!(d <= policy.max);
            previous = d;
        }
    }

    #[test]
    fn test_huge_attempt_count_saturates_at_max() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(u32::MAX), policy.max);
    }

    #[test]
    fn test_custom_policy() {
        let policy = BackoffPolicy {
            initial: Duration::from_millis(10),
            multiplier: 3,
            max: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(2), Duration::from_millis(90));
        assert_eq!(policy.delay(3), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_multiplier_holds_initial_delay() {
        let policy = BackoffPolicy {
            initial: Duration::from_millis(500),
            multiplier: 0,
            max: Duration::from_millis(30_000),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(5), Duration::from_millis(500));
    }
}
