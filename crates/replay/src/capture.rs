//! `capture` / `append_fixtures` (spec.md §4.8).

use chrono::Utc;
use db::models::ExecutionReplayPackRow;
use db::DbPool;
use uuid::Uuid;

use crate::error::ReplayError;
use crate::fixture::{merge_fixtures, Fixture};

fn fixtures_from_json(value: &serde_json::Value) -> Vec<Fixture> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

fn fixtures_to_json(fixtures: &[Fixture]) -> serde_json::Value {
    serde_json::to_value(fixtures).expect("Vec<Fixture> always serialises")
}

/// Upsert a replay pack keyed by `execution_id`.
#[allow(clippy::too_many_arguments)]
pub async fn capture(
    pool: &DbPool,
    execution_id: Uuid,
    workspace_id: Uuid,
    workflow_id: Uuid,
    mode: &str,
    source_execution_id: Option<Uuid>,
    trigger_snapshot: serde_json::Value,
    workflow_snapshot: serde_json::Value,
    fixtures: Vec<Fixture>,
    deterministic_seed: i64,
    retention_days: u32,
) -> Result<ExecutionReplayPackRow, ReplayError> {
    let expires_at = Utc::now() + chrono::Duration::days(retention_days as i64);
    let row = db::repository::replay_packs::upsert_pack(
        pool,
        execution_id,
        workspace_id,
        workflow_id,
        source_execution_id,
        mode,
        deterministic_seed,
        workflow_snapshot,
        trigger_snapshot,
        fixtures_to_json(&fixtures),
        serde_json::Value::Null,
        expires_at,
    )
    .await?;
    Ok(row)
}

/// Merge `new_fixtures` into the pack's existing set by `request_fingerprint`
/// (latest wins) and persist the result.
pub async fn append_fixtures(pool: &DbPool, execution_id: Uuid, new_fixtures: Vec<Fixture>) -> Result<Vec<Fixture>, ReplayError> {
    let pack = db::repository::replay_packs::get_pack(pool, execution_id).await?;
    let existing = fixtures_from_json(&pack.fixtures);
    let merged = merge_fixtures(existing, new_fixtures);
    db::repository::replay_packs::set_fixtures(pool, execution_id, fixtures_to_json(&merged)).await?;
    Ok(merged)
}

pub async fn get_fixtures(pool: &DbPool, execution_id: Uuid) -> Result<Vec<Fixture>, ReplayError> {
    let pack = db::repository::replay_packs::get_pack(pool, execution_id).await?;
    Ok(fixtures_from_json(&pack.fixtures))
}
