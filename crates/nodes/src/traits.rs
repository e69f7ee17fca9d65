//! The `NodeExecutor` trait — the scheduler's one required collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::NodeError;

/// A replay fixture: a previously-recorded response keyed by the hash of the
/// outbound request it would have matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub request_fingerprint: String,
    pub response: Value,
}

/// Replay mode carried through a node task. When `strict` is set an
/// unmatched external request must fail instead of falling through to a
/// live call.
#[derive(Debug, Clone, Default)]
pub struct DeterministicContext {
    pub fixtures: Vec<Fixture>,
    pub strict: bool,
}

impl DeterministicContext {
    pub fn find(&self, request_fingerprint: &str) -> Option<&Value> {
        self.fixtures.iter().find(|f| f.request_fingerprint == request_fingerprint).map(|f| &f.response)
    }
}

/// Cooperative cancellation handle. Checked by node implementations at I/O
/// checkpoints; the scheduler flips it once on cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared context passed to every node during execution.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the parent workflow.
    pub workflow_id: uuid::Uuid,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// Initial input supplied when the execution was triggered.
    pub trigger_input: Value,
    /// Decrypted secrets scoped to this workflow, by credential name.
    pub secrets: std::collections::HashMap<String, String>,
    /// Present when this execution is a deterministic replay.
    pub deterministic_context: Option<DeterministicContext>,
    pub cancel: CancelHandle,
}

/// A single line a node wants attributed to its execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub level: String,
    pub message: String,
}

/// Node-reported metrics for the attempt. When `connector_key` is set, the
/// worker loop folds these into a connector reliability attempt record after
/// the node finishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub duration_ms: Option<u64>,
    pub connector_key: Option<String>,
    pub connector_operation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub output: Value,
    #[serde(default)]
    pub logs: Vec<LogLine>,
    #[serde(default)]
    pub metrics: NodeMetrics,
}

impl NodeResult {
    pub fn from_output(output: Value) -> Self {
        Self { output, logs: Vec::new(), metrics: NodeMetrics::default() }
    }
}

/// The scheduler's one required collaborator. Implementations MUST honour
/// `ctx.cancel` and MUST be pure w.r.t. `(node_type, input, config)` when
/// `ctx.deterministic_context` carries a matching fixture.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(
        &self,
        node_type: &str,
        input: Value,
        config: &Value,
        ctx: &ExecutionContext,
    ) -> Result<NodeResult, NodeError>;
}
