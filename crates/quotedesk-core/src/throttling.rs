use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Outbound request budget shared by every call the quote adapter makes.
///
/// Callers wait for budget instead of failing, so a burst of cache misses is
/// smoothed out before it reaches the rate-limited upstream.
#[derive(Clone)]
pub struct UpstreamThrottle {
    limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for UpstreamThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamThrottle").finish_non_exhaustive()
    }
}

impl UpstreamThrottle {
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests))),
        }
    }

    /// Waits until one request of budget is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Takes one request of budget if it is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
