//! Dispatch (spec C7) — gate sequence, execution persistence, replay
//! capture, and job enqueue.

use engine::{NodeCatalog, Workflow, WorkspacePolicy};
use queue::{JobPayload, Priority};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::services::Services;

pub struct DispatchRequest {
    pub workflow: Workflow,
    pub catalog: NodeCatalog,
    pub policy: Option<WorkspacePolicy>,
    pub trigger_data: serde_json::Value,
    pub mode: String,
    pub triggered_by: Option<String>,
    pub priority: Priority,
    pub estimated_cost_usd: f64,
    pub contract_strict: bool,
}

pub struct DispatchOutcome {
    pub execution_id: Uuid,
    pub job_id: Uuid,
    pub callback_token: String,
}

/// Run the gate sequence; the first failure aborts with no side effects.
pub async fn dispatch(services: &Services, req: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
    // 1. active + nonempty
    if !req.workflow.is_active {
        return Err(DispatchError::WorkflowInactive);
    }
    if req.workflow.nodes.is_empty() {
        return Err(DispatchError::WorkflowEmpty);
    }

    // 2. contract valid — reuse a snapshot already compiled for this exact
    // graph, so an unchanged workflow never pays the compile cost twice.
    let graph_hash = engine::contract::graph_hash(&req.workflow.nodes, &req.workflow.edges);
    if let Some(existing) =
        db::repository::contract_snapshots::find_by_graph_hash(&services.pool, req.workflow.id, &graph_hash).await?
    {
        if existing.status == engine::ContractStatus::Invalid.to_string() {
            let issues: Vec<engine::contract::Issue> = serde_json::from_value(existing.issues).unwrap_or_default();
            return Err(DispatchError::ContractInvalid(issues.len()));
        }
    } else {
        let snapshot = engine::compile(req.workflow.id, None, &req.workflow.nodes, &req.workflow.edges, &req.catalog, req.contract_strict);
        let contracts = serde_json::to_value(&snapshot.edge_contracts).unwrap_or(serde_json::Value::Null);
        let issues = serde_json::to_value(&snapshot.issues).unwrap_or(serde_json::Value::Null);
        db::repository::contract_snapshots::insert_snapshot(
            &services.pool,
            req.workflow.id,
            None,
            &graph_hash,
            &snapshot.status.to_string(),
            contracts,
            issues,
        )
        .await?;
        if snapshot.status == engine::ContractStatus::Invalid {
            return Err(DispatchError::ContractInvalid(snapshot.issues.len()));
        }
    }

    // 3. policy ok
    let violations = engine::violations(req.policy.as_ref(), &req.workflow.nodes);
    if let Some(first) = violations.first() {
        return Err(DispatchError::PolicyViolation(first.message.clone()));
    }

    // 4. rate limit
    services
        .rate_limiter
        .admit(req.workflow.workspace_id)
        .map_err(|retry_after| DispatchError::RateLimited { retry_after_seconds: retry_after.as_secs() })?;

    // 5. credit remaining
    let remaining = services.meter.remaining(req.workflow.workspace_id).await?;
    if remaining < req.estimated_cost_usd {
        return Err(DispatchError::InsufficientCredits { needed: req.estimated_cost_usd, available: remaining });
    }

    // Gates passed: persist, snapshot, enqueue.
    let execution = db::repository::executions::create_execution(
        &services.pool,
        req.workflow.id,
        req.workflow.workspace_id,
        &req.mode,
        req.triggered_by.as_deref(),
        req.trigger_data.clone(),
        req.workflow.settings.retry.max_attempts as i32,
        None,
        None,
        false,
    )
    .await?;

    let workflow_snapshot = serde_json::to_value(&req.workflow).unwrap_or(serde_json::Value::Null);
    replay::capture(
        &services.pool,
        execution.id,
        req.workflow.workspace_id,
        req.workflow.id,
        "live",
        None,
        req.trigger_data.clone(),
        workflow_snapshot,
        Vec::new(),
        execution.id.as_u128() as i64,
        services.config.replay.retention_days,
    )
    .await?;

    let callback_token = Uuid::new_v4().to_string();
    let partition = queue::partition_for(req.workflow.workspace_id, services.config.dispatch.job_queue_partitions);
    let payload = JobPayload {
        workflow_id: req.workflow.id,
        execution_id: execution.id,
        trigger_data: req.trigger_data,
        replay_context: None,
    };

    let job = services
        .job_queue
        .enqueue(
            req.workflow.id,
            execution.id,
            partition,
            req.priority,
            &callback_token,
            req.workflow.settings.retry.max_attempts as i32,
            payload,
        )
        .await?;

    Ok(DispatchOutcome { execution_id: execution.id, job_id: job.id, callback_token })
}
