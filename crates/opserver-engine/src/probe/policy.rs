use crate::config::ProbeConfig;
use std::time::Duration;

/// Per-candidate timing: how long to wait for a load and how long to pause
/// before starting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub direct_timeout: Duration,
    pub proxied_timeout: Duration,
    pub direct_attempts: usize,
    pub backoff_step: Duration,
}

impl ProbePolicy {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            direct_timeout: config.direct_timeout(),
            proxied_timeout: config.proxied_timeout(),
            direct_attempts: config.direct_attempts,
            backoff_step: config.backoff_step(),
        }
    }

    pub fn timeout_for(&self, index: usize) -> Duration {
        if index < self.direct_attempts {
            self.direct_timeout
        } else {
            self.proxied_timeout
        }
    }

    pub fn delay_before(&self, index: usize) -> Duration {
        self.backoff_step.saturating_mul(index as u32)
    }
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let policy = ProbePolicy::default();
        assert_eq!(policy.timeout_for(0), Duration::from_millis(3000));
        assert_eq!(policy.timeout_for(1), Duration::from_millis(3000));
        assert_eq!(policy.timeout_for(2), Duration::from_millis(6000));
        assert_eq!(policy.timeout_for(5), Duration::from_millis(6000));
    }

    #[test]
    fn test_backoff_grows_with_index() {
        let policy = ProbePolicy::default();
        assert_eq!(policy.delay_before(0), Duration::ZERO);
        assert!(policy.delay_before(1) < policy.delay_before(4));
        assert_eq!(policy.delay_before(4), Duration::from_millis(600));
    }
}
