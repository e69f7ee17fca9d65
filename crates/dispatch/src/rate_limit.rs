//! Hand-rolled token bucket rate limiter (spec.md §4.7): no `governor`
//! dependency, matching the rest of the stack's preference for small
//! hand-rolled primitives over general-purpose crates where the need is
//! this narrow.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: f64, refill_per_second: f64) -> Self {
        Self { tokens: capacity, capacity, refill_per_second, last_refill: Instant::now() }
    }

    fn try_take(&mut self) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_per_second))
        }
    }
}

/// Per-workspace token buckets, default `100/minute`.
pub struct RateLimiter {
    capacity: f64,
    per_minute: f64,
    buckets: Mutex<HashMap<Uuid, Bucket>>,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self { capacity: per_minute as f64, per_minute: per_minute as f64, buckets: Mutex::new(HashMap::new()) }
    }

    /// `Ok(())` if admitted, `Err(retry_after)` otherwise.
    pub fn admit(&self, workspace_id: Uuid) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(workspace_id).or_insert_with(|| Bucket::new(self.capacity, self.per_minute / 60.0));
        bucket.try_take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity_then_rejects() {
        let limiter = RateLimiter::new(2);
        let ws = Uuid::new_v4();
        assert!(limiter.admit(ws).is_ok());
        assert!(limiter.admit(ws).is_ok());
        assert!(limiter.admit(ws).is_err());
    }

    #[test]
    fn different_workspaces_have_independent_buckets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.admit(Uuid::new_v4()).is_ok());
        assert!(limiter.admit(Uuid::new_v4()).is_ok());
    }
}
