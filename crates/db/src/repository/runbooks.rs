//! Execution runbook repository — one row per `(execution_id, node_id)`,
//! upserted so a retried failure refreshes the row instead of duplicating it.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::ExecutionRunbookRow};

#[allow(clippy::too_many_arguments)]
pub async fn upsert_runbook(
    pool: &PgPool,
    execution_id: Uuid,
    node_id: &str,
    severity: &str,
    status: &str,
    steps: serde_json::Value,
    error_message: &str,
) -> Result<ExecutionRunbookRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ExecutionRunbookRow>(
        r#"
        INSERT INTO execution_runbooks
            (id, execution_id, node_id, severity, status, steps, error_message, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        ON CONFLICT (execution_id, node_id) DO UPDATE SET
            severity = EXCLUDED.severity,
            status = EXCLUDED.status,
            steps = EXCLUDED.steps,
            error_message = EXCLUDED.error_message,
            updated_at = EXCLUDED.updated_at
        RETURNING id, execution_id, node_id, severity, status, steps, error_message, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(node_id)
    .bind(severity)
    .bind(status)
    .bind(steps)
    .bind(error_message)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn list_runbooks(pool: &PgPool, execution_id: Uuid) -> Result<Vec<ExecutionRunbookRow>, DbError> {
    let rows = sqlx::query_as::<_, ExecutionRunbookRow>(
        r#"SELECT id, execution_id, node_id, severity, status, steps, error_message, created_at, updated_at
           FROM execution_runbooks WHERE execution_id = $1 ORDER BY created_at ASC"#,
    )
    .bind(execution_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
