use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// In-process rate gate for one provider's upstream quota.
///
/// The aggregator checks the gate before every fetch; a denied check is
/// reported as a rate-limited failure for that `(provider, ticker)` slot
/// rather than blocking the batch.
#[derive(Clone)]
pub struct ThrottleGate {
    limiter: Arc<DirectRateLimiter>,
}

impl ThrottleGate {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Try to spend one unit of rate budget.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_once_quota_is_spent() {
        let gate = ThrottleGate::new(Duration::from_secs(3600), 2);

        assert!(gate.try_acquire());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }

    #[test]
    fn zero_limit_degrades_to_one() {
        let gate = ThrottleGate::new(Duration::from_secs(3600), 0);
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }
}
