//! Connector call attempt repository — append-only writes, grouped reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{ConnectorCallAttemptRow, ConnectorMetricDailyRow},
};

#[allow(clippy::too_many_arguments)]
pub async fn insert_attempt(
    pool: &PgPool,
    execution_id: Uuid,
    execution_node_id: Option<Uuid>,
    workspace_id: Uuid,
    workflow_id: Uuid,
    connector_key: &str,
    connector_operation: &str,
    provider: Option<&str>,
    attempt_no: i32,
    is_retry: bool,
    status: &str,
    status_code: Option<i32>,
    duration_ms: Option<i64>,
    request_fingerprint: &str,
    idempotency_key: Option<&str>,
    error_code: Option<&str>,
    error_message: Option<&str>,
) -> Result<ConnectorCallAttemptRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ConnectorCallAttemptRow>(
        r#"
        INSERT INTO connector_call_attempts
            (id, execution_id, execution_node_id, workspace_id, workflow_id, connector_key,
             connector_operation, provider, attempt_no, is_retry, status, status_code,
             duration_ms, request_fingerprint, idempotency_key, error_code, error_message,
             happened_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING id, execution_id, execution_node_id, workspace_id, workflow_id, connector_key,
                  connector_operation, provider, attempt_no, is_retry, status, status_code,
                  duration_ms, request_fingerprint, idempotency_key, error_code, error_message,
                  happened_at
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(execution_node_id)
    .bind(workspace_id)
    .bind(workflow_id)
    .bind(connector_key)
    .bind(connector_operation)
    .bind(provider)
    .bind(attempt_no)
    .bind(is_retry)
    .bind(status)
    .bind(status_code)
    .bind(duration_ms)
    .bind(request_fingerprint)
    .bind(idempotency_key)
    .bind(error_code)
    .bind(error_message)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// All attempts for a workspace within `[since, until)`, used both for the
/// live metrics view and for the daily rollup job.
pub async fn list_attempts_in_range(
    pool: &PgPool,
    workspace_id: Uuid,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ConnectorCallAttemptRow>, DbError> {
    let rows = sqlx::query_as::<_, ConnectorCallAttemptRow>(
        r#"SELECT id, execution_id, execution_node_id, workspace_id, workflow_id, connector_key,
                  connector_operation, provider, attempt_no, is_retry, status, status_code,
                  duration_ms, request_fingerprint, idempotency_key, error_code, error_message,
                  happened_at
           FROM connector_call_attempts
           WHERE workspace_id = $1 AND happened_at >= $2 AND happened_at < $3
           ORDER BY happened_at ASC"#,
    )
    .bind(workspace_id)
    .bind(since)
    .bind(until)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn upsert_daily_rollup(pool: &PgPool, row: &ConnectorMetricDailyRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO connector_metrics_daily
            (workspace_id, connector_key, connector_operation, day, total, success, failure,
             retry, timeout, p50_ms, p95_ms, p99_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (workspace_id, connector_key, connector_operation, day)
        DO UPDATE SET
            total = EXCLUDED.total,
            success = EXCLUDED.success,
            failure = EXCLUDED.failure,
            retry = EXCLUDED.retry,
            timeout = EXCLUDED.timeout,
            p50_ms = EXCLUDED.p50_ms,
            p95_ms = EXCLUDED.p95_ms,
            p99_ms = EXCLUDED.p99_ms
        "#,
    )
    .bind(row.workspace_id)
    .bind(&row.connector_key)
    .bind(&row.connector_operation)
    .bind(row.day)
    .bind(row.total)
    .bind(row.success)
    .bind(row.failure)
    .bind(row.retry)
    .bind(row.timeout)
    .bind(row.p50_ms)
    .bind(row.p95_ms)
    .bind(row.p99_ms)
    .execute(pool)
    .await?;
    Ok(())
}
