//! Replay pack repository — one row per execution, keyed by `execution_id`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::ExecutionReplayPackRow};

#[allow(clippy::too_many_arguments)]
pub async fn upsert_pack(
    pool: &PgPool,
    execution_id: Uuid,
    workspace_id: Uuid,
    workflow_id: Uuid,
    source_execution_id: Option<Uuid>,
    mode: &str,
    deterministic_seed: i64,
    workflow_snapshot: serde_json::Value,
    trigger_snapshot: serde_json::Value,
    fixtures: serde_json::Value,
    environment_snapshot: serde_json::Value,
    expires_at: DateTime<Utc>,
) -> Result<ExecutionReplayPackRow, DbError> {
    let row = sqlx::query_as::<_, ExecutionReplayPackRow>(
        r#"
        INSERT INTO execution_replay_packs
            (execution_id, workspace_id, workflow_id, source_execution_id, mode,
             deterministic_seed, workflow_snapshot, trigger_snapshot, fixtures,
             environment_snapshot, captured_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (execution_id) DO UPDATE SET
            mode = EXCLUDED.mode,
            deterministic_seed = EXCLUDED.deterministic_seed,
            workflow_snapshot = EXCLUDED.workflow_snapshot,
            trigger_snapshot = EXCLUDED.trigger_snapshot,
            fixtures = EXCLUDED.fixtures,
            environment_snapshot = EXCLUDED.environment_snapshot,
            expires_at = EXCLUDED.expires_at
        RETURNING execution_id, workspace_id, workflow_id, source_execution_id, mode,
                  deterministic_seed, workflow_snapshot, trigger_snapshot, fixtures,
                  environment_snapshot, captured_at, expires_at
        "#,
    )
    .bind(execution_id)
    .bind(workspace_id)
    .bind(workflow_id)
    .bind(source_execution_id)
    .bind(mode)
    .bind(deterministic_seed)
    .bind(workflow_snapshot)
    .bind(trigger_snapshot)
    .bind(fixtures)
    .bind(environment_snapshot)
    .bind(Utc::now())
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_pack(pool: &PgPool, execution_id: Uuid) -> Result<ExecutionReplayPackRow, DbError> {
    let row = sqlx::query_as::<_, ExecutionReplayPackRow>(
        r#"SELECT execution_id, workspace_id, workflow_id, source_execution_id, mode,
                  deterministic_seed, workflow_snapshot, trigger_snapshot, fixtures,
                  environment_snapshot, captured_at, expires_at
           FROM execution_replay_packs WHERE execution_id = $1"#,
    )
    .bind(execution_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

/// Replace the `fixtures` column wholesale; callers merge in-memory first.
pub async fn set_fixtures(
    pool: &PgPool,
    execution_id: Uuid,
    fixtures: serde_json::Value,
) -> Result<(), DbError> {
    sqlx::query("UPDATE execution_replay_packs SET fixtures = $1 WHERE execution_id = $2")
        .bind(fixtures)
        .bind(execution_id)
        .execute(pool)
        .await?;
    Ok(())
}
