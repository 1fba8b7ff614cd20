use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

// Below this the quota period overflows anything sensible; treat it as the floor.
const MIN_RATE: f64 = 0.001;

/// Process-wide token bucket every outbound probe must pass through.
/// Burst capacity is 1, so probes are spaced at the configured rate.
pub struct ProbeLimiter {
    inner: RwLock<(f64, Arc<DefaultDirectRateLimiter>)>,
}

impl ProbeLimiter {
    pub fn new(rate: f64) -> Self {
        Self { inner: RwLock::new((rate, Arc::new(build_limiter(rate)))) }
    }

    pub fn rate(&self) -> f64 {
        self.inner.read().0
    }

    /// Replace the limiter. Tasks already waiting keep waiting on the old
    /// bucket; rate changes are rare operational adjustments, not
    /// safety-critical, so the lost update is acceptable.
    pub fn set_rate(&self, rate: f64) {
        *self.inner.write() = (rate, Arc::new(build_limiter(rate)));
    }

    /// Wait for a token. Returns false if `cancel` fires first, in which
    /// case no token is consumed on behalf of the caller.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        let limiter = self.inner.read().1.clone();
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = limiter.until_ready() => true,
        }
    }
}

fn build_limiter(rate: f64) -> DefaultDirectRateLimiter {
    let period = Duration::from_secs_f64(1.0 / rate.max(MIN_RATE));
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::MIN);
    RateLimiter::direct(quota)
}
