//! Per-(action, identity) request quotas.

pub mod policy;
pub mod store;

use std::sync::Arc;

use anyhow::Result;

use crate::clock::Clock;
pub use policy::{Algorithm, CounterState, Decision, RateLimitAction};
pub use store::{CounterKey, CounterStore, MemoryCounterStore, SqliteCounterStore};

/// Checks requests against the static quota table.
pub struct RateLimiter {
    store: Box<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    enabled: bool,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Box<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            enabled: true,
        }
    }

    /// Limiter over a fresh in-process store.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Box::new(MemoryCounterStore::new()), clock)
    }

    /// A disabled limiter admits every request without touching the store.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one request for `identity` against `action`'s quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter store fails.
    pub fn check(&self, action: RateLimitAction, identity: &str) -> Result<Decision> {
        if !self.enabled {
            return Ok(Decision::ALLOW);
        }

        let now_ms = self.clock.now_ms();
        let algorithm = action.algorithm();
        let key = CounterKey::new(action, identity);
        let decision = self
            .store
            .modify(&key, &mut |previous| algorithm.apply(previous, now_ms))?;

        if decision.allowed {
            tracing::trace!(action = action.as_str(), identity, "rate limit check passed");
        } else {
            tracing::debug!(
                action = action.as_str(),
                identity,
                retry_after_ms = decision.retry_after_ms,
                "rate limit exceeded"
            );
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn limiter_reads_time_from_clock() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = RateLimiter::in_memory(clock.clone());

        for _ in 0..2 {
            let decision = limiter
                .check(RateLimitAction::UpdatePreferences, "ada")
                .expect("check");
            assert!(decision.allowed);
        }
        let denied = limiter
            .check(RateLimitAction::UpdatePreferences, "ada")
            .expect("check");
        assert_eq!(denied, Decision::deny(6_000));

        clock.advance(6_000);
        assert!(limiter.check(RateLimitAction::UpdatePreferences, "ada").expect("check").allowed);
    }

    #[test]
    fn identities_have_independent_quotas() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = RateLimiter::in_memory(clock);
        for _ in 0..3 {
            limiter.check(RateLimitAction::DeleteTask, "ada").expect("check");
        }
        assert!(!limiter.check(RateLimitAction::DeleteTask, "ada").expect("check").allowed);
        assert!(limiter.check(RateLimitAction::DeleteTask, "grace").expect("check").allowed);
        assert!(limiter.check(RateLimitAction::CreateTask, "ada").expect("check").allowed);
    }

    #[test]
    fn disabled_limiter_admits_everything() {
        let limiter = RateLimiter::in_memory(Arc::new(ManualClock::new(0))).enabled(false);
        assert!(!limiter.is_enabled());
        for _ in 0..100 {
            assert!(limiter.check(RateLimitAction::Signup, "ada").expect("check").allowed);
        }
    }
}
