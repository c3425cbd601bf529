//! Retry delay policy.

use std::time::Duration;

use rand::Rng;

use crate::config::{BackoffKind, SupervisorConfig};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay applied between connection attempts.
///
/// Attempts are unbounded; the policy only decides how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same delay before every retry.
    Fixed(Duration),
    /// Exponential growth from `base` up to `max`, with jitter.
    Exponential { base: Duration, max: Duration },
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(delay) => delay,
            RetryPolicy::Exponential { base, max } => calculate_backoff(
                attempt.max(1),
                base.as_millis() as u64,
                max.as_millis() as u64,
            ),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(Duration::from_secs(3))
    }
}

impl From<&SupervisorConfig> for RetryPolicy {
    fn from(config: &SupervisorConfig) -> Self {
        let base = Duration::from_millis(config.retry_delay_ms);
        match config.backoff {
            BackoffKind::Fixed => RetryPolicy::Fixed(base),
            BackoffKind::Exponential => RetryPolicy::Exponential {
                base,
                max: Duration::from_millis(config.max_delay_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
        assert!(max.as_millis() < 1100);
    }

    #[test]
    fn test_fixed_policy_never_grows() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(3));
        assert_eq!(policy.delay(50), Duration::from_secs(3));
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = SupervisorConfig::default();
        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy::Fixed(Duration::from_millis(3000))
        );

        config.backoff = BackoffKind::Exponential;
        config.max_delay_ms = 10_000;
        let policy = RetryPolicy::from(&config);
        assert!(policy.delay(1) >= Duration::from_millis(3000));
        assert!(policy.delay(8) >= Duration::from_millis(10_000));
        assert!(policy.delay(8) < Duration::from_millis(11_000));
    }
}
