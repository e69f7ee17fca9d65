//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// The scheduler uses the variant to decide retry behaviour:
/// - `retryable = true`  — the task is re-queued with exponential back-off.
/// - `retryable = false` — the node is marked failed immediately.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct NodeError {
    pub message: String,
    pub retryable: bool,
}

impl NodeError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: true }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false }
    }
}
