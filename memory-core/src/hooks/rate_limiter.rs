//! Per-hook token-bucket rate limiting (spec §4.4 step 2), generalised from
//! the teacher's `memory-mcp/src/server/rate_limiter.rs` client-bucket
//! design to one bucket per [`HookId`] instead of per client.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

use super::vocabulary::HookId;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            tokens: f64::from(capacity),
            capacity: f64::from(capacity),
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// One token bucket per hook id, refilling at `rate_limit_per_min / 60` per
/// second with burst capacity `rate_limit_per_min` (spec §4.4).
pub struct HookRateLimiter {
    capacity: u32,
    buckets: Mutex<HashMap<HookId, TokenBucket>>,
}

impl HookRateLimiter {
    #[must_use]
    pub fn new(rate_limit_per_min: u32) -> Self {
        Self {
            capacity: rate_limit_per_min,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the fire is allowed, consuming a token; `false` if
    /// the hook should raise `RATE_LIMITED`.
    pub fn check(&self, hook_id: HookId) -> bool {
        let refill_per_sec = f64::from(self.capacity) / 60.0;
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .entry(hook_id)
            .or_insert_with(|| TokenBucket::new(self.capacity, refill_per_sec));
        bucket.try_consume()
    }
}
