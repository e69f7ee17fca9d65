//! `MockNode` — a test double for `NodeExecutor`.
//!
//! Useful in unit and integration tests where a real node implementation is
//! either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{NodeError, NodeExecutor};
use crate::traits::{ExecutionContext, NodeResult};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Fail with a retryable error.
    FailRetryable(String),
    /// Fail with a fatal error.
    FailFatal(String),
    /// Fail retryably for the first `n` calls, then return a value.
    FailThenSucceed { remaining_failures: AtomicUsize, msg: String, value: Value },
}

/// A mock executor that dispatches by `node_type`, recording every call it
/// receives and returning a programmer-specified result per type.
#[derive(Default)]
pub struct MockNode {
    behaviours: HashMap<String, MockBehaviour>,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockNode {
    pub fn new() -> Self {
        Self { behaviours: HashMap::new(), calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn returning(mut self, node_type: impl Into<String>, value: Value) -> Self {
        self.behaviours.insert(node_type.into(), MockBehaviour::ReturnValue(value));
        self
    }

    pub fn failing_fatal(mut self, node_type: impl Into<String>, msg: impl Into<String>) -> Self {
        self.behaviours.insert(node_type.into(), MockBehaviour::FailFatal(msg.into()));
        self
    }

    pub fn failing_retryable(mut self, node_type: impl Into<String>, msg: impl Into<String>) -> Self {
        self.behaviours.insert(node_type.into(), MockBehaviour::FailRetryable(msg.into()));
        self
    }

    /// Fail retryably `failures` times, then succeed with `value` on the next call.
    pub fn failing_then_succeeding(mut self, node_type: impl Into<String>, failures: usize, msg: impl Into<String>, value: Value) -> Self {
        self.behaviours.insert(
            node_type.into(),
            MockBehaviour::FailThenSucceed { remaining_failures: AtomicUsize::new(failures), msg: msg.into(), value },
        );
        self
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NodeExecutor for MockNode {
    async fn execute(&self, node_type: &str, input: Value, _config: &Value, _ctx: &ExecutionContext) -> Result<NodeResult, NodeError> {
        self.calls.lock().unwrap().push((node_type.to_string(), input.clone()));

        match self.behaviours.get(node_type) {
            Some(MockBehaviour::ReturnValue(v)) => {
                let mut out = json!({ "node_type": node_type });
                if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), v.as_object()) {
                    for (k, val) in v_obj {
                        out_obj.insert(k.clone(), val.clone());
                    }
                }
                Ok(NodeResult::from_output(out))
            }
            Some(MockBehaviour::FailRetryable(msg)) => Err(NodeError::retryable(msg.clone())),
            Some(MockBehaviour::FailFatal(msg)) => Err(NodeError::fatal(msg.clone())),
            Some(MockBehaviour::FailThenSucceed { remaining_failures, msg, value }) => {
                let prev = remaining_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { Some(0) }).unwrap();
                if prev > 0 {
                    Err(NodeError::retryable(msg.clone()))
                } else {
                    let mut out = json!({ "node_type": node_type });
                    if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), value.as_object()) {
                        for (k, val) in v_obj {
                            out_obj.insert(k.clone(), val.clone());
                        }
                    }
                    Ok(NodeResult::from_output(out))
                }
            }
            None => Ok(NodeResult::from_output(input)),
        }
    }
}
