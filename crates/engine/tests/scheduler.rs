//! End-to-end scenario coverage for the DAG/scheduler pair, exercised
//! through the public `engine` API the way a worker process would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use engine::{Dag, Scheduler};
use engine::config::SchedulerConfig;
use engine::models::{Edge, NodeData, NodeDefinition, NodeKind};
use nodes::{CancelHandle, DeterministicContext, ExecutionContext, NodeError, NodeExecutor, NodeResult};
use serde_json::{json, Value};
use uuid::Uuid;

fn node(id: &str, node_type: &str, kind: NodeKind) -> NodeDefinition {
    NodeDefinition { id: id.into(), node_type: node_type.into(), node_kind: kind, position: None, data: NodeData { label: id.into(), config: Value::Null } }
}

fn edge(id: &str, source: &str, target: &str, source_handle: Option<&str>) -> Edge {
    Edge { id: id.into(), source: source.into(), target: target.into(), source_handle: source_handle.map(String::from), target_handle: None, condition: None }
}

fn ctx_with(deterministic_context: Option<DeterministicContext>) -> ExecutionContext {
    ExecutionContext {
        workflow_id: Uuid::new_v4(),
        execution_id: Uuid::new_v4(),
        trigger_input: json!({"x": 1}),
        secrets: HashMap::new(),
        deterministic_context,
        cancel: CancelHandle::new(),
    }
}

/// S1: `A -> B -> C`, all action nodes. Expects three nodes completed in
/// order and a `result_data` containing both downstream outputs.
#[tokio::test]
async fn s1_linear_chain_completes_with_downstream_outputs() {
    let nodes = vec![
        node("A", "trigger", NodeKind::Trigger),
        node("B", "action", NodeKind::Action),
        node("C", "action", NodeKind::Action),
    ];
    let edges = vec![edge("e1", "A", "B", None), edge("e2", "B", "C", None)];
    let dag = Dag::from_parts(&nodes, &edges).unwrap();

    let mock = Arc::new(nodes_mock().returning("trigger", json!({})).returning("action", json!({"ran": true})));
    let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

    let outcome = scheduler.run(ctx_with(None), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();

    assert_eq!(outcome.status, engine::ExecutionStatus::Completed);
    assert!(outcome.outputs.contains_key("B"));
    assert!(outcome.outputs.contains_key("C"));
}

/// S2: condition node `A` emits `{"output":"left"}`; edge `A->L` carries
/// handle `left`, edge `A->R` carries handle `right`. `L` runs, `R` skips.
#[tokio::test]
async fn s2_condition_node_gates_unmatched_branch() {
    let nodes = vec![
        node("A", "if", NodeKind::Condition),
        node("L", "action", NodeKind::Action),
        node("R", "action", NodeKind::Action),
    ];
    let edges = vec![edge("e1", "A", "L", Some("left")), edge("e2", "A", "R", Some("right"))];
    let dag = Dag::from_parts(&nodes, &edges).unwrap();

    let mock = Arc::new(nodes_mock().returning("if", json!({"output": "left"})).returning("action", json!({"done": true})));
    let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

    let outcome = scheduler.run(ctx_with(None), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();

    assert_eq!(outcome.status, engine::ExecutionStatus::Completed);
    assert_eq!(outcome.node_states.get("L").unwrap().status, engine::scheduler::NodeStatus::Completed);
    assert_eq!(outcome.node_states.get("R").unwrap().status, engine::scheduler::NodeStatus::Skipped);
}

/// S3: node `B` fails twice (transient) then succeeds on attempt 3 with
/// `max_attempts=3`. Expects a completed execution with `B.attempt == 3`.
#[tokio::test]
async fn s3_transient_failures_recover_within_max_attempts() {
    let nodes = vec![node("B", "flaky", NodeKind::Action)];
    let dag = Dag::from_parts(&nodes, &[]).unwrap();

    let mock = Arc::new(nodes_mock().failing_then_succeeding("flaky", 2, "upstream hiccup", json!({"ok": true})));
    let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

    let outcome = scheduler.run(ctx_with(None), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();

    assert_eq!(outcome.status, engine::ExecutionStatus::Completed);
    assert_eq!(outcome.node_states.get("B").unwrap().attempt, 3);
}

/// S4: node `B` fails three straight times with `max_attempts=3`. Expects a
/// failed execution, `B` marked failed, downstream never touched.
#[tokio::test]
async fn s4_exhausted_retries_fail_the_execution() {
    let nodes = vec![node("B", "flaky", NodeKind::Action), node("C", "action", NodeKind::Action)];
    let edges = vec![edge("e1", "B", "C", None)];
    let dag = Dag::from_parts(&nodes, &edges).unwrap();

    let mock = Arc::new(nodes_mock().failing_retryable("flaky", "downstream unreachable"));
    let scheduler = Scheduler::new(dag, mock, SchedulerConfig::default());

    let outcome = scheduler.run(ctx_with(None), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();

    assert_eq!(outcome.status, engine::ExecutionStatus::Failed);
    assert_eq!(outcome.node_states.get("B").unwrap().status, engine::scheduler::NodeStatus::Failed);
    assert!(!outcome.outputs.contains_key("C"));
}

/// S6: a fixture recorded for a given request fingerprint is served back
/// from `ctx.deterministic_context` without the node performing its live
/// call. Matches replay packs captured by the `replay` crate's `capture`.
#[tokio::test]
async fn s6_replay_serves_fixture_without_a_live_call() {
    let nodes = vec![node("B", "http_request", NodeKind::Action)];
    let dag = Dag::from_parts(&nodes, &[]).unwrap();

    let fixture = nodes::Fixture {
        request_fingerprint: "sha256(POST /v1/send {\"to\":\"a@b\"})".to_string(),
        response: json!({"body": "Message-Id: 42"}),
    };
    let deterministic_context = DeterministicContext { fixtures: vec![fixture], strict: true };

    let executor = Arc::new(ReplayAwareNode::default());
    let scheduler = Scheduler::new(dag, executor.clone(), SchedulerConfig::default());

    let outcome = scheduler.run(ctx_with(Some(deterministic_context)), Duration::from_secs(5), Duration::from_secs(30), 3, Duration::from_millis(1)).await.unwrap();

    assert_eq!(outcome.status, engine::ExecutionStatus::Completed);
    assert_eq!(outcome.outputs.get("B").unwrap().get("body").and_then(|v| v.as_str()), Some("Message-Id: 42"));
    assert_eq!(executor.live_calls.load(Ordering::SeqCst), 0);
}

fn nodes_mock() -> nodes::MockNode {
    nodes::MockNode::new()
}

/// A node double that honours `ctx.deterministic_context` the way a real
/// HTTP connector would: fixture hit short-circuits the live call path.
#[derive(Default)]
struct ReplayAwareNode {
    live_calls: AtomicUsize,
}

#[async_trait]
impl NodeExecutor for ReplayAwareNode {
    async fn execute(&self, _node_type: &str, _input: Value, _config: &Value, ctx: &ExecutionContext) -> Result<NodeResult, NodeError> {
        let fingerprint = "sha256(POST /v1/send {\"to\":\"a@b\"})";
        if let Some(deterministic_context) = &ctx.deterministic_context {
            if let Some(response) = deterministic_context.find(fingerprint) {
                return Ok(NodeResult::from_output(response.clone()));
            }
            if deterministic_context.strict {
                return Err(NodeError::fatal("no fixture for request and strict replay is set"));
            }
        }
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        Ok(NodeResult::from_output(json!({"body": "live call"})))
    }
}
