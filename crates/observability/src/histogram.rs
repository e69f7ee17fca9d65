//! Fixed-bucket histogram over duration-in-milliseconds observations.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Default bucket boundaries, in milliseconds, tuned for node/connector
/// call latencies (sub-millisecond through multi-minute).
pub const DEFAULT_BUCKETS_MS: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 30_000.0,
];

/// A Prometheus-style cumulative histogram: each bucket counts all
/// observations `<= le`.
#[derive(Debug)]
pub struct Histogram {
    bounds: Vec<f64>,
    bucket_counts: Vec<AtomicI64>,
    sum_bits: AtomicU64,
    count: AtomicI64,
}

impl Histogram {
    pub fn new(bounds: &[f64]) -> Self {
        let mut bounds = bounds.to_vec();
        bounds.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let bucket_counts = bounds.iter().map(|_| AtomicI64::new(0)).collect();
        Self {
            bounds,
            bucket_counts,
            sum_bits: AtomicU64::new(0.0f64.to_bits()),
            count: AtomicI64::new(0),
        }
    }

    pub fn with_default_buckets() -> Self {
        Self::new(DEFAULT_BUCKETS_MS)
    }

    /// Record a raw observation (already in the histogram's unit, ms here).
    pub fn observe(&self, value: f64) {
        for (bound, counter) in self.bounds.iter().zip(self.bucket_counts.iter()) {
            if value <= *bound {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        loop {
            let current = self.sum_bits.load(Ordering::Relaxed);
            let next = (f64::from_bits(current) + value).to_bits();
            if self
                .sum_bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Convenience for timing an operation: `observe(duration.as_millis())`.
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64() * 1000.0);
    }

    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Relaxed))
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// `(upper_bound, cumulative_count)` pairs in ascending bound order.
    pub fn buckets(&self) -> Vec<(f64, i64)> {
        self.bounds
            .iter()
            .zip(self.bucket_counts.iter())
            .map(|(b, c)| (*b, c.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_buckets_include_lower_observations() {
        let h = Histogram::new(&[10.0, 50.0, 100.0]);
        h.observe(5.0);
        h.observe(40.0);
        h.observe(200.0);

        let buckets = h.buckets();
        assert_eq!(buckets[0], (10.0, 1)); // only the 5ms observation
        assert_eq!(buckets[1], (50.0, 2)); // 5ms and 40ms
        assert_eq!(buckets[2], (100.0, 2)); // 200ms falls outside all buckets
        assert_eq!(h.count(), 3);
        assert_eq!(h.sum(), 245.0);
    }
}
