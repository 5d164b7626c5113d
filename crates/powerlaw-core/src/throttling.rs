use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request budget granted by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingPolicy {
    /// Length of the quota window in milliseconds.
    pub window_ms: u64,
    /// Requests allowed per window.
    pub limit: u32,
}

impl Default for PacingPolicy {
    /// Well under Binance's public weight budget for `/klines`.
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            limit: 600,
        }
    }
}

/// Paces upstream page requests so a long backfill does not trip the
/// provider's rate limit. Cloning shares the underlying budget.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer").finish_non_exhaustive()
    }
}

impl RequestPacer {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_policy(policy))),
        }
    }

    /// Non-blocking check; `false` means the next request would have to wait.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Suspend until one request permit is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(PacingPolicy::default())
    }
}

fn quota_from_policy(policy: PacingPolicy) -> Quota {
    let burst = NonZeroU32::new(policy.limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell =
        (Duration::from_millis(policy.window_ms).as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
