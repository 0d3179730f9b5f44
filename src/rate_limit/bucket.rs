use std::time::Instant;

use turnate_config::RateTierConfig;

/// Token bucket for a single client within one tier
///
/// Tokens are fractional and always stay within `[0, capacity]`. A bucket is
/// born full, so a new client gets its whole burst immediately.
#[derive(Debug, Clone)]
pub struct ClientBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl ClientBucket {
    pub fn full(config: RateTierConfig, now: Instant) -> Self {
        let capacity = f64::from(config.burst);
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec: config.refill_per_sec,
            last_refill: now,
        }
    }

    /// Token count the bucket would hold at `now`, without mutating it
    pub fn tokens_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * self.refill_per_sec).min(self.capacity)
    }

    /// Refill for the elapsed time, then spend one token if available
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.tokens = self.tokens_at(now);
        if now > self.last_refill {
            self.last_refill = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// A full bucket carries no state worth keeping
    pub fn is_idle_at(&self, now: Instant) -> bool {
        self.tokens_at(now) >= self.capacity
    }
}
