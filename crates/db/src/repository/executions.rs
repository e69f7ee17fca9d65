//! Execution, execution-node, and execution-log repository functions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{ExecutionLogRow, ExecutionNodeRow, ExecutionRow},
};

// ---------------------------------------------------------------------------
// executions
// ---------------------------------------------------------------------------

/// Create a new execution record in `pending` status.
#[allow(clippy::too_many_arguments)]
pub async fn create_execution(
    pool: &PgPool,
    workflow_id: Uuid,
    workspace_id: Uuid,
    mode: &str,
    triggered_by: Option<&str>,
    trigger_data: serde_json::Value,
    max_attempts: i32,
    parent_execution_id: Option<Uuid>,
    replay_of_execution_id: Option<Uuid>,
    is_deterministic_replay: bool,
) -> Result<ExecutionRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ExecutionRow>(
        r#"
        INSERT INTO workflow_executions
            (id, workflow_id, workspace_id, status, mode, triggered_by, trigger_data,
             attempt, max_attempts, parent_execution_id, replay_of_execution_id,
             is_deterministic_replay)
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, 1, $7, $8, $9, $10)
        RETURNING id, workflow_id, workspace_id, status, mode, triggered_by, started_at,
                  finished_at, duration_ms, trigger_data, result_data, error, attempt,
                  max_attempts, parent_execution_id, replay_of_execution_id,
                  is_deterministic_replay, estimated_cost_usd
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(workspace_id)
    .bind(mode)
    .bind(triggered_by)
    .bind(trigger_data)
    .bind(max_attempts)
    .bind(parent_execution_id)
    .bind(replay_of_execution_id)
    .bind(is_deterministic_replay)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_execution(pool: &PgPool, id: Uuid) -> Result<ExecutionRow, DbError> {
    let row = sqlx::query_as::<_, ExecutionRow>(
        r#"SELECT id, workflow_id, workspace_id, status, mode, triggered_by, started_at,
                  finished_at, duration_ms, trigger_data, result_data, error, attempt,
                  max_attempts, parent_execution_id, replay_of_execution_id,
                  is_deterministic_replay, estimated_cost_usd
           FROM workflow_executions WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

/// Transition an execution to `running`, stamping `started_at`.
pub async fn mark_running(pool: &PgPool, execution_id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE workflow_executions SET status = 'running', started_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(execution_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Transition an execution to a terminal status, stamping `finished_at` and
/// `duration_ms`, and optionally the final result or error.
pub async fn finish_execution(
    pool: &PgPool,
    execution_id: Uuid,
    status: &str,
    result_data: Option<serde_json::Value>,
    error: Option<&str>,
) -> Result<(), DbError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE workflow_executions
        SET status = $1,
            finished_at = $2,
            duration_ms = EXTRACT(EPOCH FROM ($2 - COALESCE(started_at, $2))) * 1000,
            result_data = $3,
            error = $4
        WHERE id = $5
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(result_data)
    .bind(error)
    .bind(execution_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn bump_attempt(pool: &PgPool, execution_id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE workflow_executions SET attempt = attempt + 1 WHERE id = $1")
        .bind(execution_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_estimated_cost(pool: &PgPool, execution_id: Uuid, cost_usd: f64) -> Result<(), DbError> {
    sqlx::query("UPDATE workflow_executions SET estimated_cost_usd = $1 WHERE id = $2")
        .bind(cost_usd)
        .bind(execution_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// execution_nodes
// ---------------------------------------------------------------------------

/// Insert a running execution-node row. `started_at` is the instant the
/// scheduler actually dispatched the node, not the instant this row is
/// flushed to the database — callers persisting after the fact (the worker
/// loop flushes once a run completes) must pass the real in-memory
/// timestamp so cross-node happens-before ordering survives the flush.
pub async fn start_execution_node(
    pool: &PgPool,
    execution_id: Uuid,
    node_id: &str,
    node_type: &str,
    sequence: i32,
    started_at: DateTime<Utc>,
    input_data: serde_json::Value,
) -> Result<ExecutionNodeRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ExecutionNodeRow>(
        r#"
        INSERT INTO execution_nodes
            (id, execution_id, node_id, node_type, status, sequence, started_at, input_data)
        VALUES ($1, $2, $3, $4, 'running', $5, $6, $7)
        RETURNING id, execution_id, node_id, node_type, status, sequence, started_at,
                  finished_at, duration_ms, input_data, output_data, error
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(node_id)
    .bind(node_type)
    .bind(sequence)
    .bind(started_at)
    .bind(input_data)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn finish_execution_node(
    pool: &PgPool,
    execution_node_id: Uuid,
    status: &str,
    finished_at: DateTime<Utc>,
    output_data: Option<serde_json::Value>,
    error: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE execution_nodes
        SET status = $1,
            finished_at = $2,
            duration_ms = EXTRACT(EPOCH FROM ($2 - COALESCE(started_at, $2))) * 1000,
            output_data = $3,
            error = $4
        WHERE id = $5
        "#,
    )
    .bind(status)
    .bind(finished_at)
    .bind(output_data)
    .bind(error)
    .bind(execution_node_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark a node `skipped` without ever running it (conditional gating).
pub async fn skip_execution_node(
    pool: &PgPool,
    execution_id: Uuid,
    node_id: &str,
    node_type: &str,
    sequence: i32,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO execution_nodes
            (id, execution_id, node_id, node_type, status, sequence, started_at, finished_at,
             duration_ms, input_data)
        VALUES ($1, $2, $3, $4, 'skipped', $5, $6, $6, 0, 'null'::jsonb)
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(node_id)
    .bind(node_type)
    .bind(sequence)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_execution_nodes(pool: &PgPool, execution_id: Uuid) -> Result<Vec<ExecutionNodeRow>, DbError> {
    let rows = sqlx::query_as::<_, ExecutionNodeRow>(
        r#"SELECT id, execution_id, node_id, node_type, status, sequence, started_at,
                  finished_at, duration_ms, input_data, output_data, error
           FROM execution_nodes WHERE execution_id = $1 ORDER BY sequence ASC"#,
    )
    .bind(execution_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// execution_logs
// ---------------------------------------------------------------------------

pub async fn append_log(
    pool: &PgPool,
    execution_id: Uuid,
    execution_node_id: Option<Uuid>,
    level: &str,
    message: &str,
    context: serde_json::Value,
) -> Result<ExecutionLogRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ExecutionLogRow>(
        r#"
        INSERT INTO execution_logs (id, execution_id, execution_node_id, level, message, context, logged_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, execution_id, execution_node_id, level, message, context, logged_at
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(execution_node_id)
    .bind(level)
    .bind(message)
    .bind(context)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn list_logs(pool: &PgPool, execution_id: Uuid) -> Result<Vec<ExecutionLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ExecutionLogRow>(
        r#"SELECT id, execution_id, execution_node_id, level, message, context, logged_at
           FROM execution_logs WHERE execution_id = $1 ORDER BY logged_at ASC"#,
    )
    .bind(execution_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
