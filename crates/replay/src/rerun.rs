//! `rerun` (spec.md §4.8) — clone a source execution into a child
//! deterministic replay and enqueue it.

use std::sync::Arc;

use db::models::ExecutionRow;
use db::DbPool;
use queue::{partition_for, JobPayload, JobQueue, Priority, ReplayContext};
use uuid::Uuid;

use crate::capture::{capture, get_fixtures};
use crate::error::ReplayError;

pub struct RerunRequest {
    pub source_execution_id: Uuid,
    pub triggered_by: Option<String>,
    pub override_trigger: Option<serde_json::Value>,
    pub workflow_snapshot: serde_json::Value,
    pub strict_replay: bool,
    pub job_queue_partitions: u32,
    pub replay_retention_days: u32,
}

/// Create a child `Execution` in `mode=replay`, capture a new pack carrying
/// the source's fixtures, and enqueue a job whose `deterministic_context`
/// replays them.
pub async fn rerun(
    pool: &DbPool,
    queue: &Arc<dyn JobQueue>,
    req: RerunRequest,
) -> Result<(ExecutionRow, serde_json::Value), ReplayError> {
    let source = db::repository::executions::get_execution(pool, req.source_execution_id).await?;
    let trigger_data = req.override_trigger.unwrap_or_else(|| source.trigger_data.clone());

    let child = db::repository::executions::create_execution(
        pool,
        source.workflow_id,
        source.workspace_id,
        "replay",
        req.triggered_by.as_deref(),
        trigger_data.clone(),
        source.max_attempts,
        None,
        Some(source.id),
        true,
    )
    .await?;

    let fixtures = get_fixtures(pool, source.id).await.unwrap_or_default();

    let pack = capture(
        pool,
        child.id,
        child.workspace_id,
        child.workflow_id,
        "replay",
        Some(source.id),
        trigger_data.clone(),
        req.workflow_snapshot.clone(),
        fixtures.clone(),
        child.id.as_u128() as i64,
        req.replay_retention_days,
    )
    .await?;

    let deterministic_context = ReplayContext {
        mode: "replay".to_string(),
        seed: Some(pack.deterministic_seed.to_string()),
        fixtures: serde_json::to_value(&fixtures).expect("fixtures always serialise"),
        workflow_snapshot: Some(req.workflow_snapshot),
    };

    let payload = JobPayload {
        workflow_id: child.workflow_id,
        execution_id: child.id,
        trigger_data,
        replay_context: Some(deterministic_context.clone()),
    };

    let partition = partition_for(child.workspace_id, req.job_queue_partitions);
    let callback_token = Uuid::new_v4().to_string();
    queue
        .enqueue(child.workflow_id, child.id, partition, Priority::Default, &callback_token, source.max_attempts, payload)
        .await?;

    let context_json = serde_json::json!({
        "mode": deterministic_context.mode,
        "seed": deterministic_context.seed,
        "strict": req.strict_replay,
    });

    Ok((child, context_json))
}
