//! Sign-in Rate Limiter
//!
//! Throttles nonce issuance and signature verification so a single client
//! cannot hammer the sign-in endpoints.
//!
//! - Per-IP rate limiting (default: 20 sign-in requests per minute)
//! - Global rate limiting (default: 1000 sign-in requests per minute)
//!
//! State is in-memory and per process. Once the per-IP table reaches
//! `MAX_TRACKED_IPS`, entries whose quota has fully replenished are swept;
//! a throttled IP keeps its state until its quota recovers.

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::{keyed::DashMapStateStore, InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use shared::config::RateLimitConfig;
use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;

/// Default rate limit: 20 sign-in requests per minute per IP
pub const DEFAULT_PER_IP_RATE: u32 = 20;

/// Default global rate limit: 1000 sign-in requests per minute
pub const DEFAULT_GLOBAL_RATE: u32 = 1000;

/// Table size at which idle per-IP entries are swept
const MAX_TRACKED_IPS: usize = 10_000;

/// Rate limit error
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RateLimitError {
    pub message: String,
    pub retry_after_secs: u64,
}

type DirectRateLimiter<C> =
    GovernorRateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;
type IpRateLimiter<C> = GovernorRateLimiter<
    String,
    DashMapStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;

/// Sign-in rate limiter
///
/// Clones share state.
#[derive(Clone)]
pub struct AuthRateLimiter<C: Clock = DefaultClock> {
    global_limiter: Arc<DirectRateLimiter<C>>,
    per_ip_limiter: Arc<IpRateLimiter<C>>,
}

impl AuthRateLimiter {
    /// Create a limiter with the default rates
    pub fn new() -> Self {
        Self::with_rates(DEFAULT_GLOBAL_RATE, DEFAULT_PER_IP_RATE)
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::with_rates(config.global_per_minute, config.per_ip_per_minute)
    }

    /// Create with custom global and per-IP rates (requests per minute)
    ///
    /// A rate of zero is treated as one.
    pub fn with_rates(global_rate: u32, per_ip_rate: u32) -> Self {
        Self::with_clock(global_rate, per_ip_rate, &DefaultClock::default())
    }
}

impl<C: Clock> AuthRateLimiter<C> {
    pub fn with_clock(global_rate: u32, per_ip_rate: u32, clock: &C) -> Self {
        let global_quota = Quota::per_minute(per_minute(global_rate));
        let per_ip_quota = Quota::per_minute(per_minute(per_ip_rate));

        Self {
            global_limiter: Arc::new(GovernorRateLimiter::direct_with_clock(global_quota, clock)),
            per_ip_limiter: Arc::new(GovernorRateLimiter::dashmap_with_clock(per_ip_quota, clock)),
        }
    }

    /// Check whether a sign-in request from `ip_address` may proceed
    pub fn check(&self, ip_address: &str) -> Result<(), RateLimitError> {
        if self.global_limiter.check().is_err() {
            tracing::warn!(ip = ip_address, "Global sign-in rate limit exceeded");
            return Err(RateLimitError {
                message: "Too many sign-in attempts. Please try again later.".to_string(),
                retry_after_secs: 1,
            });
        }

        if self.per_ip_limiter.len() >= MAX_TRACKED_IPS {
            self.sweep();
        }

        if self
            .per_ip_limiter
            .check_key(&ip_address.to_string())
            .is_err()
        {
            tracing::warn!(ip = ip_address, "Per-IP sign-in rate limit exceeded");
            return Err(RateLimitError {
                message: "Too many sign-in attempts from your IP. Please try again later."
                    .to_string(),
                retry_after_secs: 60,
            });
        }

        Ok(())
    }

    /// Drop per-IP entries indistinguishable from a fresh limiter
    fn sweep(&self) {
        let before = self.per_ip_limiter.len();
        self.per_ip_limiter.retain_recent();
        self.per_ip_limiter.shrink_to_fit();
        tracing::info!(
            removed = before.saturating_sub(self.per_ip_limiter.len()),
            remaining = self.per_ip_limiter.len(),
            "Swept sign-in rate limiter entries"
        );
    }

    #[cfg(test)]
    fn tracked_ips(&self) -> usize {
        self.per_ip_limiter.len()
    }
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn per_minute(rate: u32) -> NonZeroU32 {
    NonZeroU32::new(rate).unwrap_or(NonZeroU32::MIN)
}
