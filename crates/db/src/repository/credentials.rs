//! Credential repository — stores only encrypted envelopes.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::CredentialRow};

pub async fn create_credential(
    pool: &PgPool,
    workspace_id: Uuid,
    name: &str,
    credential_type: &str,
    data_encrypted: &str,
    expires_at: Option<chrono::DateTime<Utc>>,
) -> Result<CredentialRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        INSERT INTO credentials (id, workspace_id, name, credential_type, data_encrypted, expires_at, last_used_at)
        VALUES ($1, $2, $3, $4, $5, $6, NULL)
        RETURNING id, workspace_id, name, credential_type, data_encrypted, expires_at, last_used_at
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(name)
    .bind(credential_type)
    .bind(data_encrypted)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Fetch a batch of credentials by id, scoped to one workspace namespace.
pub async fn get_by_ids(
    pool: &PgPool,
    workspace_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<CredentialRow>, DbError> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        r#"SELECT id, workspace_id, name, credential_type, data_encrypted, expires_at, last_used_at
           FROM credentials WHERE workspace_id = $1 AND id = ANY($2)"#,
    )
    .bind(workspace_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_by_name(
    pool: &PgPool,
    workspace_id: Uuid,
    name: &str,
) -> Result<CredentialRow, DbError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        r#"SELECT id, workspace_id, name, credential_type, data_encrypted, expires_at, last_used_at
           FROM credentials WHERE workspace_id = $1 AND name = $2"#,
    )
    .bind(workspace_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

pub async fn touch_last_used(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE credentials SET last_used_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
