//! Workflow CRUD operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::WorkflowRow};

/// Insert a new workflow into the database.
///
/// `definition` must be a valid JSON object produced by serialising the
/// domain `Workflow` type from the `engine` crate.
pub async fn create_workflow(
    pool: &PgPool,
    workspace_id: Uuid,
    name: &str,
    trigger_type: &str,
    definition: serde_json::Value,
) -> Result<WorkflowRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        INSERT INTO workflows (id, workspace_id, name, is_active, is_locked, trigger_type, definition, created_at)
        VALUES ($1, $2, $3, true, false, $4, $5, $6)
        RETURNING id, workspace_id, name, is_active, is_locked, trigger_type, definition, created_at
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(name)
    .bind(trigger_type)
    .bind(definition)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single workflow by its primary key, scoped to its workspace.
pub async fn get_workflow(pool: &PgPool, workspace_id: Uuid, id: Uuid) -> Result<WorkflowRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, workspace_id, name, is_active, is_locked, trigger_type, definition, created_at
           FROM workflows WHERE id = $1 AND workspace_id = $2"#,
    )
    .bind(id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Return all workflows in a workspace, ordered by creation time (newest first).
pub async fn list_workflows(pool: &PgPool, workspace_id: Uuid) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, workspace_id, name, is_active, is_locked, trigger_type, definition, created_at
           FROM workflows WHERE workspace_id = $1 ORDER BY created_at DESC"#,
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Permanently delete a workflow by its primary key.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_workflow(pool: &PgPool, workspace_id: Uuid, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM workflows WHERE id = $1 AND workspace_id = $2")
        .bind(id)
        .bind(workspace_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Return every active webhook-triggered workflow across all workspaces,
/// for matching against an inbound webhook path at the shared ingress.
pub async fn list_webhook_candidates(pool: &PgPool) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, workspace_id, name, is_active, is_locked, trigger_type, definition, created_at
           FROM workflows WHERE trigger_type = 'webhook' AND is_active = true"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flip a workflow's `is_active` flag.
pub async fn set_active(pool: &PgPool, workspace_id: Uuid, id: Uuid, is_active: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE workflows SET is_active = $1 WHERE id = $2 AND workspace_id = $3")
        .bind(is_active)
        .bind(id)
        .bind(workspace_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
