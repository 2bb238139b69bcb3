use std::time::Duration;

/// Link lifecycle: `Disconnected --connect--> Connecting --open-->
/// Connected --unexpected close--> Reconnecting --> Connecting ...`.
///
/// After the attempt ceiling the machine parks in `Disconnected` until an
/// explicit connect. A deliberate disconnect goes straight to
/// `Disconnected` and suppresses reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Linear backoff with a hard attempt ceiling: delay = attempt × step,
/// no jitter, no cap beyond the ceiling. The historical defaults
/// (5 attempts, 2 s step) are wire-compatible with the deployed clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_millis(2000),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based). `None` once the
    /// ceiling is exceeded, which parks the link.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            None
        } else {
            Some(self.backoff_step * attempt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(4000)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_millis(10000)));
    }

    #[test]
    fn test_ceiling_parks_the_link() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for(6), None);
        assert_eq!(policy.delay_for(u32::MAX), None);
    }

    #[test]
    fn test_attempt_zero_is_not_a_retry() {
        assert_eq!(ReconnectPolicy::default().delay_for(0), None);
    }

    #[test]
    fn test_policy_is_configurable() {
        let policy = ReconnectPolicy::new(2, Duration::from_millis(10));

        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(20)));
        assert_eq!(policy.delay_for(3), None);
    }
}
