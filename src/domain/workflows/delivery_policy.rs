use time::Duration;

/// Attempts allowed per delivery before it is left as failed.
pub const MAX_ATTEMPTS: u32 = 5;

/// Attempt budget and backoff for webhook deliveries.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

impl DeliveryPolicy {
    /// Delay before the next attempt after `attempt_count` failed attempts.
    ///
    /// Doubles from `backoff_initial_ms` and stops at `backoff_max_ms`. A zero
    /// initial delay disables backoff entirely.
    pub fn next_delay(&self, attempt_count: u32) -> Duration {
        // Step 1: Compute the exponential delay (2^(attempt-1)).
        let attempt = attempt_count.max(1);
        let raw = self
            .backoff_initial_ms
            .saturating_mul(2_u64.saturating_pow(attempt - 1));

        // Step 2: Cap at the max delay.
        let capped = raw.min(self.backoff_max_ms);
        Duration::milliseconds(i64::try_from(capped).unwrap_or(i64::MAX))
    }

    /// Returns `true` while the delivery still has attempts left.
    pub fn can_attempt(&self, attempt_count: u32) -> bool {
        attempt_count < self.max_attempts
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_initial_ms: 30_000,
            backoff_max_ms: 3_600_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryPolicy, MAX_ATTEMPTS};

    #[test]
    fn given_attempts_when_next_delay_should_grow_and_cap() {
        let policy = DeliveryPolicy {
            max_attempts: MAX_ATTEMPTS,
            backoff_initial_ms: 500,
            backoff_max_ms: 5_000,
        };
        assert_eq!(policy.next_delay(1).whole_milliseconds(), 500);
        assert_eq!(policy.next_delay(2).whole_milliseconds(), 1_000);
        assert_eq!(policy.next_delay(3).whole_milliseconds(), 2_000);
        assert_eq!(policy.next_delay(10).whole_milliseconds(), 5_000);
    }

    #[test]
    fn given_zero_initial_delay_when_next_delay_should_be_zero() {
        let policy = DeliveryPolicy {
            max_attempts: MAX_ATTEMPTS,
            backoff_initial_ms: 0,
            backoff_max_ms: 5_000,
        };
        assert!(policy.next_delay(4).is_zero());
    }

    #[test]
    fn given_default_policy_when_can_attempt_should_stop_at_five() {
        let policy = DeliveryPolicy::default();
        assert!(policy.can_attempt(4));
        assert!(!policy.can_attempt(5));
        assert!(!policy.can_attempt(6));
    }
}
