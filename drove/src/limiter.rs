use arc_swap::ArcSwap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Global requests-per-second ceiling shared by every virtual user of a run.
///
/// The limiter sits behind an `ArcSwap` so the ceiling can be moved while users are
/// waiting on it; waiters on the old limiter finish against the old quota.
#[derive(Clone)]
pub struct RateCeiling {
    limiter: Arc<ArcSwap<Option<DefaultDirectRateLimiter>>>,
}

impl RateCeiling {
    pub fn new(max_rps: Option<NonZeroU32>) -> Self {
        Self {
            limiter: Arc::new(ArcSwap::from_pointee(max_rps.map(rate_limiter))),
        }
    }

    /// Replace the ceiling. `None` removes it.
    pub fn set(&self, max_rps: Option<NonZeroU32>) {
        self.limiter.store(Arc::new(max_rps.map(rate_limiter)));
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.load().is_some()
    }

    pub async fn until_ready(&self) {
        let limiter = self.limiter.load_full();
        if let Some(limiter) = limiter.as_ref() {
            limiter.until_ready().await;
        }
    }
}

impl Default for RateCeiling {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for RateCeiling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateCeiling")
            .field("limited", &self.is_limited())
            .finish()
    }
}

fn rate_limiter(max_rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(max_rps).allow_burst(NonZeroU32::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn ceiling_spaces_out_permits() {
        let ceiling = RateCeiling::new(NonZeroU32::new(20));
        let start = Instant::now();
        for _ in 0..5 {
            ceiling.until_ready().await;
        }
        // first permit is immediate, the next four are 50ms apart
        assert!(start.elapsed() >= Duration::from_millis(190));
    }

    #[tokio::test]
    #[ntest::timeout(1_000)]
    async fn unlimited_by_default() {
        let ceiling = RateCeiling::default();
        assert!(!ceiling.is_limited());
        for _ in 0..1_000 {
            ceiling.until_ready().await;
        }

        ceiling.set(NonZeroU32::new(1));
        assert!(ceiling.is_limited());
        ceiling.set(None);
        assert!(!ceiling.is_limited());
    }
}
