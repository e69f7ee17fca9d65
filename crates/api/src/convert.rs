//! Translate between `db` row shapes and `engine` domain types. The
//! `workflows.definition` column holds everything a `Workflow` needs beyond
//! its own indexed columns (`trigger_config`, `nodes`, `edges`, `settings`).

use engine::Workflow;
use serde_json::{json, Value};

pub fn workflow_from_row(row: &db::models::WorkflowRow) -> Result<Workflow, serde_json::Error> {
    let def = row.definition.as_object().cloned().unwrap_or_default();
    let value = json!({
        "id": row.id,
        "workspace_id": row.workspace_id,
        "name": row.name,
        "is_active": row.is_active,
        "is_locked": row.is_locked,
        "trigger_type": row.trigger_type,
        "trigger_config": def.get("trigger_config").cloned().unwrap_or(Value::Null),
        "nodes": def.get("nodes").cloned().unwrap_or_else(|| Value::Array(vec![])),
        "edges": def.get("edges").cloned().unwrap_or_else(|| Value::Array(vec![])),
        "settings": def.get("settings").cloned().unwrap_or(Value::Null),
        "created_at": row.created_at,
    });
    serde_json::from_value(value)
}

/// The sub-object stored in `workflows.definition`: everything not already
/// indexed as its own column.
pub fn definition_of(workflow: &Workflow) -> Value {
    json!({
        "trigger_config": workflow.trigger_config,
        "nodes": workflow.nodes,
        "edges": workflow.edges,
        "settings": workflow.settings,
    })
}

pub fn policy_from_row(row: db::models::WorkspacePolicyRow) -> Result<engine::WorkspacePolicy, serde_json::Error> {
    Ok(engine::WorkspacePolicy {
        enabled: row.enabled,
        allowed_node_types: serde_json::from_value(row.allowed_node_types)?,
        blocked_node_types: serde_json::from_value(row.blocked_node_types)?,
        allowed_ai_models: serde_json::from_value(row.allowed_ai_models)?,
        blocked_ai_models: serde_json::from_value(row.blocked_ai_models)?,
        max_execution_cost_usd: row.max_execution_cost_usd,
        max_ai_tokens: row.max_ai_tokens,
    })
}
