//! Monotonic counter backed by an atomic `i64`.

use std::sync::atomic::{AtomicI64, Ordering};

/// A counter that only ever moves up. Safe to share across threads via
/// `Arc<Counter>`; no interior mutability surprises because the only
/// operations are `inc`/`add`.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self { value: AtomicI64::new(0) }
    }

    /// Increment by one.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary (non-negative, by convention) amount.
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inc_and_add_accumulate() {
        let c = Counter::new();
        c.inc();
        c.add(4);
        assert_eq!(c.get(), 5);
    }
}
