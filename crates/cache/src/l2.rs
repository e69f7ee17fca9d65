//! The L2 backend contract — an optional distributed cache.

use async_trait::async_trait;
use std::time::Duration;

use crate::CacheError;

/// Anything that can serve as a distributed L2 tier implements this.
/// Values cross the trait boundary as opaque bytes so the backend doesn't
/// need to know about domain types — callers serialize before `set` and
/// deserialize after `get`.
#[async_trait]
pub trait L2Backend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}
