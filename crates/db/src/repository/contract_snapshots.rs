//! Contract snapshot repository — content-addressed by `graph_hash`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::WorkflowContractSnapshotRow};

pub async fn find_by_graph_hash(
    pool: &PgPool,
    workflow_id: Uuid,
    graph_hash: &str,
) -> Result<Option<WorkflowContractSnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, WorkflowContractSnapshotRow>(
        r#"SELECT id, workflow_id, workflow_version_id, graph_hash, status, contracts, issues, created_at
           FROM workflow_contract_snapshots WHERE workflow_id = $1 AND graph_hash = $2"#,
    )
    .bind(workflow_id)
    .bind(graph_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_snapshot(
    pool: &PgPool,
    workflow_id: Uuid,
    workflow_version_id: Option<Uuid>,
    graph_hash: &str,
    status: &str,
    contracts: serde_json::Value,
    issues: serde_json::Value,
) -> Result<WorkflowContractSnapshotRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, WorkflowContractSnapshotRow>(
        r#"
        INSERT INTO workflow_contract_snapshots
            (id, workflow_id, workflow_version_id, graph_hash, status, contracts, issues, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, workflow_id, workflow_version_id, graph_hash, status, contracts, issues, created_at
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(workflow_version_id)
    .bind(graph_hash)
    .bind(status)
    .bind(contracts)
    .bind(issues)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}
