//! Request pacing
//!
//! Uses the governor crate to enforce a fixed minimum delay between
//! consecutive physical requests. A single limiter is shared by every clone
//! of a client, so concurrently explored partitions still respect one
//! account-level budget.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for request pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Minimum spacing between two requests
    pub period: Duration,
    /// Requests allowed back to back before spacing kicks in
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::fixed_delay(Duration::from_millis(500))
    }
}

impl RateLimiterConfig {
    /// One request per `delay`, no bursting
    pub fn fixed_delay(delay: Duration) -> Self {
        Self {
            period: delay,
            burst_size: 1,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a limiter, or `None` when the period is zero
    pub fn new(config: &RateLimiterConfig) -> Option<Self> {
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.period)?.allow_burst(burst);

        Some(Self {
            limiter: Arc::new(Governor::direct(quota)),
        })
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}
