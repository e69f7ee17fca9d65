//! Cache-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The L2 backend failed. Per spec, L2 errors are logged and
    /// swallowed by [`crate::Cache`] — this variant exists so an
    /// [`L2Backend`](crate::L2Backend) implementation has something to
    /// return.
    #[error("l2 backend error: {0}")]
    Backend(String),
}
