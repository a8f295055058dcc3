//! Rate limiting utilities

use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Rate limiter keyed by match id
pub type MatchLimiter = RateLimiter<Uuid, DefaultKeyedStateStore<Uuid>, DefaultClock>;

/// Score submissions accepted per second per match
pub const DEFAULT_SCORE_RATE_LIMIT: u32 = 10;

/// Create a per-match limiter allowing `requests_per_second` for each key
pub fn create_match_limiter(requests_per_second: u32) -> Arc<MatchLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}
