//! Job queue repository functions.
//!
//! The queue is backed by the `job_queue` Postgres table, partitioned by
//! `partition` and ordered within a priority tier by `created_at`. Workers
//! poll with `SELECT … FOR UPDATE SKIP LOCKED` for safe concurrent claims.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::JobRow};

/// Priority tiers, highest first — callers pass one of these as `priority`.
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_NORMAL: &str = "normal";
pub const PRIORITY_LOW: &str = "low";

fn priority_rank_sql() -> &'static str {
    "CASE priority WHEN 'high' THEN 0 WHEN 'normal' THEN 1 WHEN 'low' THEN 2 ELSE 3 END"
}

/// Enqueue a new job for the given execution.
#[allow(clippy::too_many_arguments)]
pub async fn enqueue_job(
    pool: &PgPool,
    execution_id: Uuid,
    workflow_id: Uuid,
    partition: i32,
    priority: &str,
    callback_token: &str,
    max_attempts: i32,
    payload: serde_json::Value,
) -> Result<JobRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO job_queue
            (id, execution_id, workflow_id, partition, priority, callback_token, status,
             attempts, max_attempts, progress, payload, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', 0, $7, 0, $8, $9, $9)
        RETURNING id, execution_id, workflow_id, partition, priority, callback_token, status,
                  attempts, max_attempts, progress, payload, result, error, created_at,
                  updated_at, started_at, completed_at
        "#,
    )
    .bind(id)
    .bind(execution_id)
    .bind(workflow_id)
    .bind(partition)
    .bind(priority)
    .bind(callback_token)
    .bind(max_attempts)
    .bind(payload)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Atomically fetch the highest-priority, oldest pending job in a partition
/// and mark it `processing`. Returns `None` if the partition has no pending
/// jobs.
pub async fn fetch_next_job(pool: &PgPool, partition: i32) -> Result<Option<JobRow>, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        SELECT id, execution_id, workflow_id, partition, priority, callback_token, status,
               attempts, max_attempts, progress, payload, result, error, created_at,
               updated_at, started_at, completed_at
        FROM job_queue
        WHERE status = 'pending' AND partition = $1
        ORDER BY {}, created_at ASC
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
        priority_rank_sql()
    );

    let row = sqlx::query_as::<_, JobRow>(&sql)
        .bind(partition)
        .fetch_optional(&mut *tx)
        .await?;

    if let Some(ref job) = row {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE job_queue
            SET status = 'processing', attempts = attempts + 1, updated_at = $1, started_at = $1
            WHERE id = $2
            "#,
        )
        .bind(now)
        .bind(job.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    } else {
        tx.rollback().await?;
    }

    Ok(row)
}

pub async fn update_progress(pool: &PgPool, job_id: Uuid, progress: i32) -> Result<(), DbError> {
    sqlx::query("UPDATE job_queue SET progress = $1, updated_at = $2 WHERE id = $3")
        .bind(progress)
        .bind(Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark a job as completed, storing its result payload.
pub async fn complete_job(pool: &PgPool, job_id: Uuid, result: serde_json::Value) -> Result<(), DbError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE job_queue
        SET status = 'completed', progress = 100, result = $1, updated_at = $2, completed_at = $2
        WHERE id = $3
        "#,
    )
    .bind(result)
    .bind(now)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark a job as failed, requeuing to `pending` unless `max_attempts` is
/// reached, in which case it is dead-lettered.
pub async fn fail_job(pool: &PgPool, job_id: Uuid, max_attempts: i32, error: &str) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE job_queue
        SET status = CASE WHEN attempts >= $1 THEN 'dead_lettered' ELSE 'pending' END,
            error = $2,
            updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(max_attempts)
    .bind(error)
    .bind(Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<JobRow, DbError> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"SELECT id, execution_id, workflow_id, partition, priority, callback_token, status,
                  attempts, max_attempts, progress, payload, result, error, created_at,
                  updated_at, started_at, completed_at
           FROM job_queue WHERE id = $1"#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

/// Look a job up by its callback token, used to authenticate async worker
/// callbacks without exposing the job id as a bearer credential.
pub async fn get_by_callback_token(pool: &PgPool, token: &str) -> Result<JobRow, DbError> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"SELECT id, execution_id, workflow_id, partition, priority, callback_token, status,
                  attempts, max_attempts, progress, payload, result, error, created_at,
                  updated_at, started_at, completed_at
           FROM job_queue WHERE callback_token = $1"#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}
