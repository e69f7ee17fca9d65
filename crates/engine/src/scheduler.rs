//! Scheduler (spec C6) — worker-pool driven execution of a compiled DAG with
//! conditional branching, retries, merged inputs, and cancellation.
//!
//! A single coordinator owns all mutable execution state behind an RW lock;
//! a fixed pool of workers pulls `NodeTask`s off a bounded channel and calls
//! out to the caller's `NodeExecutor`. Workers never schedule — only the
//! coordinator decides what runs next.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use nodes::{ExecutionContext, NodeError, NodeExecutor, NodeMetrics, NodeResult};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::config::SchedulerConfig;
use crate::dag::Dag;
use crate::error::EngineError;
use crate::models::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Scheduled,
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct NodeState {
    pub status: NodeStatus,
    pub attempt: u32,
    /// When the node was first dispatched. Captured at the real moment of
    /// scheduling so the happens-before ordering between nodes survives
    /// later persistence, which may happen well after the fact.
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self { status: NodeStatus::Pending, attempt: 1, started_at: None, finished_at: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

/// All mutable per-execution state, guarded by a single RW lock: readers
/// during merge-inputs, writer during state transitions.
#[derive(Debug, Default)]
pub struct ExecutionState {
    pub node_states: HashMap<String, NodeState>,
    pub outputs: HashMap<String, Value>,
    pub node_errors: HashMap<String, String>,
    /// The merged input each dispatched node actually ran with, keyed by
    /// node id. Populated at dispatch time, read back by callers that
    /// persist execution-node rows after the run completes.
    pub inputs: HashMap<String, Value>,
    /// Metrics reported by each completed node, keyed by node id. Read back
    /// by callers that bill connector calls and ingest reliability records.
    pub metrics: HashMap<String, NodeMetrics>,
}

impl ExecutionState {
    fn is_done(&self, node_id: &str) -> bool {
        matches!(
            self.node_states.get(node_id).map(|s| s.status),
            Some(NodeStatus::Completed) | Some(NodeStatus::Skipped)
        )
    }
}

struct NodeTask {
    node_id: String,
    node_type: String,
    input: Value,
    config: Value,
    attempt: u32,
}

enum Outcome {
    Success(NodeResult),
    Failure(NodeError),
}

struct TaskResult {
    node_id: String,
    attempt: u32,
    outcome: Outcome,
}

/// Result of a completed scheduler run.
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub outputs: HashMap<String, Value>,
    pub node_states: HashMap<String, NodeState>,
    pub errors: HashMap<String, String>,
    pub inputs: HashMap<String, Value>,
    pub metrics: HashMap<String, NodeMetrics>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Drives a single workflow execution to completion.
pub struct Scheduler {
    dag: Dag,
    executor: Arc<dyn NodeExecutor>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(dag: Dag, executor: Arc<dyn NodeExecutor>, config: SchedulerConfig) -> Self {
        Self { dag, executor, config }
    }

    /// Run the DAG to completion against `trigger_input`. `workflow_node_timeout`
    /// and `workflow_timeout` override the scheduler's defaults when the
    /// workflow's own settings specify them.
    pub async fn run(
        &self,
        base_ctx: ExecutionContext,
        node_timeout: Duration,
        workflow_timeout: Duration,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Result<ExecutionOutcome, EngineError> {
        let started_at = Utc::now();
        let result = tokio::time::timeout(
            workflow_timeout,
            self.run_inner(base_ctx.clone(), node_timeout, max_attempts, retry_delay),
        )
        .await;

        let finished_at = Utc::now();

        match result {
            Ok(Ok((status, state))) => Ok(ExecutionOutcome {
                status,
                outputs: state.outputs,
                node_states: state.node_states,
                errors: state.node_errors,
                inputs: state.inputs,
                metrics: state.metrics,
                started_at,
                finished_at,
            }),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                base_ctx.cancel.cancel();
                Ok(ExecutionOutcome {
                    status: ExecutionStatus::TimedOut,
                    outputs: HashMap::new(),
                    node_states: HashMap::new(),
                    errors: HashMap::new(),
                    inputs: HashMap::new(),
                    metrics: HashMap::new(),
                    started_at,
                    finished_at,
                })
            }
        }
    }

    async fn run_inner(
        &self,
        base_ctx: ExecutionContext,
        node_timeout: Duration,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Result<(ExecutionStatus, ExecutionState), EngineError> {
        let (task_tx, task_rx) = mpsc::channel::<NodeTask>(self.config.task_queue_capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<TaskResult>(self.config.task_queue_capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));

        let state = Arc::new(RwLock::new(ExecutionState::default()));
        for node_id in self.dag.nodes.keys() {
            state.write().await.node_states.insert(node_id.clone(), NodeState::default());
        }

        let mut workers = Vec::with_capacity(self.config.worker_concurrency);
        for _ in 0..self.config.worker_concurrency {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let executor = self.executor.clone();
            let ctx = base_ctx.clone();
            workers.push(tokio::spawn(async move {
                worker_loop(task_rx, result_tx, executor, ctx, node_timeout).await;
            }));
        }
        drop(result_tx);

        // Seed entry nodes with the trigger payload.
        let mut in_flight: usize = 0;
        {
            let mut guard = state.write().await;
            let now = Utc::now();
            for node_id in &self.dag.entry_nodes {
                let entry = guard.node_states.get_mut(node_id).unwrap();
                entry.status = NodeStatus::Scheduled;
                entry.started_at = Some(now);
                guard.inputs.insert(node_id.clone(), base_ctx.trigger_input.clone());
            }
        }
        for node_id in &self.dag.entry_nodes {
            let node = self.dag.node(node_id).expect("entry node exists");
            task_tx
                .send(NodeTask {
                    node_id: node_id.clone(),
                    node_type: node.node_type.clone(),
                    input: base_ctx.trigger_input.clone(),
                    config: node.data.config.clone(),
                    attempt: 1,
                })
                .await
                .ok();
            in_flight += 1;
        }

        let mut any_failed = false;
        let mut cancelled = false;

        while in_flight > 0 {
            let Some(result) = result_rx.recv().await else { break };
            in_flight -= 1;

            if base_ctx.cancel.is_cancelled() {
                cancelled = true;
            }

            match result.outcome {
                Outcome::Success(node_result) => {
                    let mut guard = state.write().await;
                    guard.metrics.insert(result.node_id.clone(), node_result.metrics.clone());
                    guard.outputs.insert(result.node_id.clone(), node_result.output);
                    let entry = guard.node_states.get_mut(&result.node_id).unwrap();
                    entry.status = NodeStatus::Completed;
                    entry.finished_at = Some(Utc::now());
                    drop(guard);

                    if !cancelled {
                        in_flight += self
                            .advance_frontier(&state, &task_tx, max_attempts)
                            .await;
                    }
                }
                Outcome::Failure(err) => {
                    if err.retryable && result.attempt < max_attempts && !cancelled {
                        let delay = retry_delay * 2u32.pow(result.attempt.saturating_sub(1));
                        let delay = delay.min(self.config.max_retry_delay);
                        let node = self.dag.node(&result.node_id).expect("node exists");
                        let task_tx = task_tx.clone();
                        let node_id = result.node_id.clone();
                        let node_type = node.node_type.clone();
                        let config = node.data.config.clone();
                        let input = {
                            let guard = state.read().await;
                            merge_inputs(&self.dag, &node_id, &guard)
                        };
                        let attempt = result.attempt + 1;
                        {
                            let mut guard = state.write().await;
                            guard.node_states.get_mut(&node_id).unwrap().attempt = attempt;
                        }
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            task_tx.send(NodeTask { node_id, node_type, input, config, attempt }).await.ok();
                        });
                        in_flight += 1;
                    } else {
                        any_failed = true;
                        let mut guard = state.write().await;
                        let entry = guard.node_states.get_mut(&result.node_id).unwrap();
                        entry.status = NodeStatus::Failed;
                        entry.finished_at = Some(Utc::now());
                        guard.node_errors.insert(result.node_id.clone(), err.message.clone());
                    }
                }
            }
        }

        drop(task_tx);
        for w in workers {
            w.abort();
        }

        let guard = state.read().await;
        let status = if cancelled {
            ExecutionStatus::Cancelled
        } else if any_failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Completed
        };
        drop(guard);

        let final_state = Arc::try_unwrap(state).map(|lock| lock.into_inner()).unwrap_or_default();
        Ok((status, final_state))
    }

    /// Compute the next ready frontier, apply conditional gating, and enqueue
    /// tasks for every node that becomes scheduled. Returns the number of
    /// tasks enqueued.
    async fn advance_frontier(
        &self,
        state: &Arc<RwLock<ExecutionState>>,
        task_tx: &mpsc::Sender<NodeTask>,
        _max_attempts: u32,
    ) -> usize {
        loop {
            let mut to_skip = Vec::new();
            let mut to_schedule = Vec::new();

            {
                let guard = state.read().await;
                for node_id in self.dag.order.iter() {
                    let current = guard.node_states.get(node_id).map(|s| s.status);
                    if !matches!(current, Some(NodeStatus::Pending)) {
                        continue;
                    }

                    let upstreams = self.dag.upstream_of(node_id);
                    if upstreams.iter().any(|u| !guard.is_done(u) && guard.node_states.get(u).map(|s| s.status) != Some(NodeStatus::Failed)) {
                        continue;
                    }
                    // Every upstream is completed, skipped, or failed — this
                    // node is ready to resolve one way or another.
                    if upstreams.iter().any(|u| guard.node_states.get(u).map(|s| s.status) == Some(NodeStatus::Failed)) {
                        to_skip.push(node_id.clone());
                        continue;
                    }

                    let gated_out = upstreams.iter().any(|u| self.is_condition_mismatch(u, node_id, &guard));
                    if gated_out {
                        to_skip.push(node_id.clone());
                    } else {
                        to_schedule.push(node_id.clone());
                    }
                }
            }

            if to_skip.is_empty() && to_schedule.is_empty() {
                return 0;
            }

            if !to_skip.is_empty() {
                let mut guard = state.write().await;
                let now = Utc::now();
                for node_id in &to_skip {
                    let entry = guard.node_states.get_mut(node_id).unwrap();
                    entry.status = NodeStatus::Skipped;
                    entry.started_at = Some(now);
                    entry.finished_at = Some(now);
                }
            }

            if !to_schedule.is_empty() {
                let mut scheduled_count = 0;
                let mut inputs_by_node = HashMap::new();
                {
                    let guard = state.read().await;
                    for node_id in &to_schedule {
                        inputs_by_node.insert(node_id.clone(), merge_inputs(&self.dag, node_id, &guard));
                    }
                }
                {
                    let mut guard = state.write().await;
                    let now = Utc::now();
                    for node_id in &to_schedule {
                        let entry = guard.node_states.get_mut(node_id).unwrap();
                        entry.status = NodeStatus::Scheduled;
                        entry.started_at = Some(now);
                        guard.inputs.insert(node_id.clone(), inputs_by_node[node_id].clone());
                    }
                }
                for node_id in &to_schedule {
                    let node = self.dag.node(node_id).expect("node exists");
                    let input = inputs_by_node[node_id].clone();
                    task_tx
                        .send(NodeTask {
                            node_id: node_id.clone(),
                            node_type: node.node_type.clone(),
                            input,
                            config: node.data.config.clone(),
                            attempt: 1,
                        })
                        .await
                        .ok();
                    scheduled_count += 1;
                }
                return scheduled_count;
            }
            // Only skips happened — loop again, since skipping may unblock
            // further downstream nodes in the same pass.
        }
    }

    /// `u` is `node_id`'s upstream via a condition node whose emitted handle
    /// does not match the edge's `source_handle`.
    fn is_condition_mismatch(&self, upstream: &str, node_id: &str, state: &ExecutionState) -> bool {
        let Some(upstream_node) = self.dag.node(upstream) else { return false };
        if upstream_node.node_kind != NodeKind::Condition {
            return false;
        }
        let Some(edge) = self.dag.edge_map.get(&(upstream.to_string(), node_id.to_string())) else { return false };
        let Some(handle) = &edge.source_handle else { return false };
        let Some(output) = state.outputs.get(upstream) else { return true };
        let selected = output.get("output").and_then(|v| v.as_str());
        selected != Some(handle.as_str())
    }
}

/// Build `{upstream_node_id: upstream_output}` for `node_id`'s completed
/// upstreams — the merged input every `NodeExecutor` consumes.
fn merge_inputs(dag: &Dag, node_id: &str, state: &ExecutionState) -> Value {
    let mut merged = serde_json::Map::new();
    for upstream in dag.upstream_of(node_id) {
        if let Some(output) = state.outputs.get(upstream) {
            merged.insert(upstream.clone(), output.clone());
        }
    }
    Value::Object(merged)
}

async fn worker_loop(
    task_rx: Arc<Mutex<mpsc::Receiver<NodeTask>>>,
    result_tx: mpsc::Sender<TaskResult>,
    executor: Arc<dyn NodeExecutor>,
    ctx: ExecutionContext,
    node_timeout: Duration,
) {
    loop {
        let task = {
            let mut rx = task_rx.lock().await;
            rx.recv().await
        };
        let Some(task) = task else { break };

        if ctx.cancel.is_cancelled() {
            let _ = result_tx
                .send(TaskResult {
                    node_id: task.node_id,
                    attempt: task.attempt,
                    outcome: Outcome::Failure(NodeError::fatal("execution cancelled")),
                })
                .await;
            continue;
        }

        let started = Instant::now();
        let outcome = match tokio::time::timeout(node_timeout, executor.execute(&task.node_type, task.input, &task.config, &ctx)).await {
            Ok(Ok(mut result)) => {
                if result.metrics.duration_ms.is_none() {
                    result.metrics.duration_ms = Some(started.elapsed().as_millis() as u64);
                }
                Outcome::Success(result)
            }
            Ok(Err(err)) => Outcome::Failure(err),
            Err(_elapsed) => Outcome::Failure(NodeError::retryable(format!("node '{}' timed out", task.node_id))),
        };

        if result_tx.send(TaskResult { node_id: task.node_id, attempt: task.attempt, outcome }).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, NodeData, NodeDefinition};
    use nodes::MockNode;
    use std::collections::HashMap as StdHashMap;

    fn node(id: &str, node_type: &str, kind: NodeKind) -> NodeDefinition {
        NodeDefinition { id: id.into(), node_type: node_type.into(), node_kind: kind, position: None, data: NodeData { label: id.into(), config: Value::Null } }
    }

    fn edge(id: &str, source: &str, target: &str, source_handle: Option<&str>) -> Edge {
        Edge { id: id.into(), source: source.into(), target: target.into(), source_handle: source_handle.map(String::from), target_handle: None, condition: None }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            trigger_input: serde_json::json!({"seed": true}),
            secrets: StdHashMap::new(),
            deterministic_context: None,
            cancel: nodes::CancelHandle::new(),
        }
    }

    #[tokio::test]
    async fn linear_workflow_completes_in_order() {
        let nodes = vec![node("a", "trigger", NodeKind::Trigger), node("b", "action", NodeKind::Action)];
        let edges = vec![edge("e1", "a", "b", None)];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();

        let mock = Arc::new(MockNode::new().returning("trigger", serde_json::json!({"x": 1})).returning("action", serde_json::json!({"y": 2})));
        let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

        let outcome = scheduler.run(ctx(), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Completed);
        assert!(outcome.outputs.contains_key("b"));
    }

    #[tokio::test]
    async fn condition_node_skips_unmatched_branch() {
        let nodes = vec![
            node("a", "trigger", NodeKind::Trigger),
            node("cond", "if", NodeKind::Condition),
            node("yes", "action", NodeKind::Action),
            node("no", "action", NodeKind::Action),
        ];
        let edges = vec![
            edge("e1", "a", "cond", None),
            edge("e2", "cond", "yes", Some("true")),
            edge("e3", "cond", "no", Some("false")),
        ];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();

        let mock = Arc::new(
            MockNode::new()
                .returning("trigger", serde_json::json!({}))
                .returning("if", serde_json::json!({"output": "true"}))
                .returning("action", serde_json::json!({"done": true})),
        );
        let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

        let outcome = scheduler.run(ctx(), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Completed);
        assert_eq!(outcome.node_states.get("yes").unwrap().status, NodeStatus::Completed);
        assert_eq!(outcome.node_states.get("no").unwrap().status, NodeStatus::Skipped);
    }

    #[tokio::test]
    async fn retryable_failure_exhausts_attempts_and_fails_node() {
        let nodes = vec![node("a", "flaky", NodeKind::Action)];
        let dag = Dag::from_parts(&nodes, &[]).unwrap();

        let mock = Arc::new(MockNode::new().failing_retryable("flaky", "upstream unavailable"));
        let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

        let outcome = scheduler.run(ctx(), Duration::from_secs(5), Duration::from_secs(30), 2, Duration::from_millis(1)).await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Failed);
        assert_eq!(outcome.node_states.get("a").unwrap().status, NodeStatus::Failed);
    }

    #[tokio::test]
    async fn transient_failure_succeeds_on_final_attempt() {
        let nodes = vec![node("b", "flaky", NodeKind::Action)];
        let dag = Dag::from_parts(&nodes, &[]).unwrap();

        let mock = Arc::new(MockNode::new().failing_then_succeeding("flaky", 2, "transient blip", serde_json::json!({"ok": true})));
        let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

        let outcome = scheduler.run(ctx(), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Completed);
        assert_eq!(outcome.node_states.get("b").unwrap().attempt, 3);
        assert!(outcome.outputs.get("b").unwrap().get("ok").is_some());
    }

    #[tokio::test]
    async fn fatal_failure_stops_downstream_scheduling() {
        let nodes = vec![node("a", "boom", NodeKind::Action), node("b", "action", NodeKind::Action)];
        let edges = vec![edge("e1", "a", "b", None)];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();

        let mock = Arc::new(MockNode::new().failing_fatal("boom", "bad config"));
        let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

        let outcome = scheduler.run(ctx(), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Failed);
        assert!(!outcome.outputs.contains_key("b"));
    }
}
