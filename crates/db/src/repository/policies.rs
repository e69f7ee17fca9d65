//! Workspace policy repository — one row per workspace, upserted in place.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::WorkspacePolicyRow};

pub async fn get_policy(pool: &PgPool, workspace_id: Uuid) -> Result<Option<WorkspacePolicyRow>, DbError> {
    let row = sqlx::query_as::<_, WorkspacePolicyRow>(
        r#"SELECT workspace_id, enabled, allowed_node_types, blocked_node_types,
                  allowed_ai_models, blocked_ai_models, max_execution_cost_usd,
                  max_ai_tokens, redaction_rules
           FROM workspace_policies WHERE workspace_id = $1"#,
    )
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[allow(clippy::too_many_arguments)]
pub async fn upsert_policy(
    pool: &PgPool,
    workspace_id: Uuid,
    enabled: bool,
    allowed_node_types: serde_json::Value,
    blocked_node_types: serde_json::Value,
    allowed_ai_models: serde_json::Value,
    blocked_ai_models: serde_json::Value,
    max_execution_cost_usd: Option<f64>,
    max_ai_tokens: Option<i64>,
    redaction_rules: serde_json::Value,
) -> Result<WorkspacePolicyRow, DbError> {
    let row = sqlx::query_as::<_, WorkspacePolicyRow>(
        r#"
        INSERT INTO workspace_policies
            (workspace_id, enabled, allowed_node_types, blocked_node_types,
             allowed_ai_models, blocked_ai_models, max_execution_cost_usd,
             max_ai_tokens, redaction_rules)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (workspace_id) DO UPDATE SET
            enabled = EXCLUDED.enabled,
            allowed_node_types = EXCLUDED.allowed_node_types,
            blocked_node_types = EXCLUDED.blocked_node_types,
            allowed_ai_models = EXCLUDED.allowed_ai_models,
            blocked_ai_models = EXCLUDED.blocked_ai_models,
            max_execution_cost_usd = EXCLUDED.max_execution_cost_usd,
            max_ai_tokens = EXCLUDED.max_ai_tokens,
            redaction_rules = EXCLUDED.redaction_rules
        RETURNING workspace_id, enabled, allowed_node_types, blocked_node_types,
                  allowed_ai_models, blocked_ai_models, max_execution_cost_usd,
                  max_ai_tokens, redaction_rules
        "#,
    )
    .bind(workspace_id)
    .bind(enabled)
    .bind(allowed_node_types)
    .bind(blocked_node_types)
    .bind(allowed_ai_models)
    .bind(blocked_ai_models)
    .bind(max_execution_cost_usd)
    .bind(max_ai_tokens)
    .bind(redaction_rules)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
