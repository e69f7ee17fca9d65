//! The two-level [`Cache`] combining [`L1Cache`] with an optional
//! [`L2Backend`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use observability::Registry;

use crate::{CacheError, L1Cache, L2Backend};

/// Background sweep interval, matching spec.md's stated default.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct Cache<V> {
    l1: Arc<L1Cache<V>>,
    l2: Option<Arc<dyn L2Backend>>,
    default_ttl: Duration,
    metrics: Option<Arc<Registry>>,
    metric_prefix: &'static str,
}

impl<V> Cache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(capacity: usize, default_ttl: Duration, metric_prefix: &'static str) -> Self {
        Self {
            l1: Arc::new(L1Cache::new(capacity, default_ttl)),
            l2: None,
            default_ttl,
            metrics: None,
            metric_prefix,
        }
    }

    pub fn with_l2(mut self, backend: Arc<dyn L2Backend>) -> Self {
        self.l2 = Some(backend);
        self
    }

    pub fn with_metrics(mut self, registry: Arc<Registry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    fn record(&self, name: &str) {
        if let Some(registry) = &self.metrics {
            registry
                .counter(&format!("{}_{}", self.metric_prefix, name), &[])
                .inc();
        }
    }

    /// Spawn the periodic L1 expiry sweep. Returns the task handle so
    /// callers can abort it on shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(DEFAULT_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = this.l1.sweep_expired();
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep evicted expired entries");
                }
            }
        })
    }

    /// L1-first, then L2 (best-effort), lookup.
    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(v) = self.l1.get(key) {
            self.record("l1_hits_total");
            return Some(v);
        }
        self.record("l1_misses_total");

        if let Some(l2) = &self.l2 {
            match l2.get(key).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<V>(&bytes) {
                    Ok(value) => {
                        self.record("l2_hits_total");
                        self.l1.set(key, value.clone(), None);
                        return Some(value);
                    }
                    Err(e) => {
                        warn!(error = %e, "l2 value failed to deserialize");
                    }
                },
                Ok(None) => {
                    self.record("l2_misses_total");
                }
                Err(e) => {
                    warn!(error = %e, "l2 backend get failed");
                }
            }
        }
        None
    }

    /// `ttl = None` uses the cache's configured default. L1 is always
    /// written; L2 writes are best-effort and failures are swallowed.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        self.l1.set(key, value.clone(), ttl);

        if let Some(l2) = &self.l2 {
            let ttl = ttl.unwrap_or(self.default_ttl);
            match serde_json::to_vec(&value) {
                Ok(bytes) => {
                    if let Err(e) = l2.set(key, bytes, ttl).await {
                        warn!(error = %e, "l2 backend set failed");
                    }
                }
                Err(e) => warn!(error = %e, "value failed to serialize for l2"),
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        self.l1.delete(key);
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.delete(key).await {
                warn!(error = %e, "l2 backend delete failed");
            }
        }
    }

    pub async fn clear(&self) {
        self.l1.clear();
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.clear().await {
                warn!(error = %e, "l2 backend clear failed");
            }
        }
    }

    /// On miss, call `loader` once and populate both levels. Concurrent
    /// callers may race and both invoke the loader — the spec explicitly
    /// accepts this in exchange for simpler semantics, so loaders must be
    /// idempotent.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(key).await {
            return Ok(v);
        }
        let value = loader().await?;
        self.set(key, value.clone(), None).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn get_or_load_populates_cache_on_miss() {
        let cache: Cache<i32> = Cache::new(10, Duration::from_secs(60), "test");
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        let value = cache
            .get_or_load("k", || async move {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(42)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second call is a hit — loader not invoked again.
        let calls_clone = calls.clone();
        let value = cache
            .get_or_load("k", || async move {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(0)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_then_get_is_a_miss() {
        let cache: Cache<i32> = Cache::new(10, Duration::from_secs(60), "test");
        cache.set("k", 7, None).await;
        cache.delete("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    struct FailingL2;

    #[async_trait::async_trait]
    impl L2Backend for FailingL2 {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Backend("down".into()))
        }
        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".into()))
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn l2_errors_are_swallowed_and_l1_remains_authoritative() {
        let cache: Cache<i32> = Cache::new(10, Duration::from_secs(60), "test")
            .with_l2(Arc::new(FailingL2));
        cache.set("k", 9, None).await;
        assert_eq!(cache.get("k").await, Some(9));
    }
}
