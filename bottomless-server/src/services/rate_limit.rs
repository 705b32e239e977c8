use std::num::NonZeroU32;
use std::time::Duration;
use dashmap::DashMap;
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::middleware::NoOpMiddleware;
use governor::Quota;
use crate::hardening::MIN_ACTION_INTERVAL;
use crate::models::types::OwnerId;

type OwnerLimiter<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Per-owner throttle: at most one accepted action per interval.
///
/// Each owner gets a direct GCRA limiter with a burst of one, so an accepted
/// action opens the next slot exactly one interval later and refused attempts
/// do not push it back. Shared by every connection task, hence the concurrent map.
pub struct RateLimiter<C: Clock = DefaultClock> {
    limiters: DashMap<OwnerId, OwnerLimiter<C>>,
    quota: Quota,
    clock: C,
    min_interval: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Limiter reading time from `clock`; tests drive it with a fake clock.
    pub fn with_clock(clock: C) -> Self {
        let quota = Quota::with_period(MIN_ACTION_INTERVAL)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
            .allow_burst(NonZeroU32::MIN);
        Self {
            limiters: DashMap::new(),
            quota,
            clock,
            min_interval: MIN_ACTION_INTERVAL,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn allow(&self, owner: OwnerId) -> bool {
        // the entry guard holds the shard lock while the owner's limiter is created
        let limiter = self
            .limiters
            .entry(owner)
            .or_insert_with(|| OwnerLimiter::direct_with_clock(self.quota, &self.clock));
        limiter.check().is_ok()
    }

    /// Drop tracking for an owner; called when the owner disconnects.
    pub fn forget(&self, owner: OwnerId) {
        self.limiters.remove(&owner);
    }

    pub fn tracked(&self) -> usize {
        self.limiters.len()
    }
}
