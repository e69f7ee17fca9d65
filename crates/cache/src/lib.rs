//! `cache` crate — the multi-level TTL cache (spec C1).
//!
//! L1 is an in-process LRU with per-entry expiry. L2 is an optional
//! external store behind the [`L2Backend`] trait; callers that don't need
//! distributed caching simply never construct one. `get_or_load` does not
//! deduplicate concurrent loads — loaders are expected to be idempotent,
//! matching the spec's stated simplification.

pub mod error;
pub mod l1;
pub mod l2;

mod cache_impl;

pub use cache_impl::Cache;
pub use error::CacheError;
pub use l1::L1Cache;
pub use l2::L2Backend;
