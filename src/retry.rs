//! Retry policy for transient server errors.

use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default wait before the first retry.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Upper bound for any single wait.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(20);

/// Retry policy applied by [`MagentoClient`](crate::MagentoClient).
///
/// Only HTTP 500 and 503 responses are retried. The wait before retry `n`
/// (1-based) doubles from `wait` and is capped at `max_wait`, so the
/// default policy waits 5s, 10s, then 20s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub wait: Duration,
    /// Maximum wait between two attempts.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRIES,
            wait: DEFAULT_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Create a policy with custom bounds.
    #[must_use]
    pub fn new(max_retries: u32, wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_retries,
            wait,
            max_wait: max_wait.max(wait),
        }
    }

    /// Whether a response with this status may be retried.
    pub fn is_retryable_status(status: u16) -> bool {
        status == 500 || status == 503
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays_are_bounded_and_non_decreasing() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (1..=policy.max_retries)
            .map(|n| policy.delay_for(n))
            .collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(20)
            ]
        );
        for pair in delays.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_delay_caps_at_max_wait() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(10), DEFAULT_MAX_WAIT);
        assert_eq!(policy.delay_for(u32::MAX), DEFAULT_MAX_WAIT);
    }

    #[test]
    fn test_only_500_and_503_are_retryable() {
        assert!(RetryPolicy::is_retryable_status(500));
        assert!(RetryPolicy::is_retryable_status(503));
        assert!(!RetryPolicy::is_retryable_status(502));
        assert!(!RetryPolicy::is_retryable_status(404));
        assert!(!RetryPolicy::is_retryable_status(400));
    }

    #[test]
    fn test_max_wait_never_below_wait() {
        let policy = RetryPolicy::new(2, Duration::from_secs(3), Duration::from_secs(1));
        assert_eq!(policy.max_wait, Duration::from_secs(3));
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
    }
}
