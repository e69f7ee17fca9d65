use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use db::repository::{policies as policy_repo, workflows as wf_repo};
use dispatch::{DispatchOutcome, DispatchRequest};
use engine::TriggerType;
use queue::Priority;
use serde_json::Value;

use super::AppState;
use crate::convert::{policy_from_row, workflow_from_row};
use crate::handlers::executions::status_for;

/// Webhook paths aren't workspace-scoped at the URL level — the first
/// active webhook-triggered workflow whose `trigger_config.path` matches
/// wins, mirroring a single shared ingress in front of many workspaces.
pub async fn handle_webhook(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let rows = wf_repo::list_webhook_candidates(&state.services.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let matched = rows.into_iter().find_map(|row| {
        let workflow = workflow_from_row(&row).ok()?;
        if workflow.trigger_type != TriggerType::Webhook || !workflow.is_active {
            return None;
        }
        let configured_path = workflow.trigger_config.get("path")?.as_str()?;
        (configured_path == path).then_some(workflow)
    });

    let workflow = matched.ok_or(StatusCode::NOT_FOUND)?;
    let workspace_id = workflow.workspace_id;

    let policy = match policy_repo::get_policy(&state.services.pool, workspace_id).await {
        Ok(Some(row)) => Some(policy_from_row(row).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?),
        Ok(None) => None,
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let estimated_cost_usd = workflow
        .nodes
        .iter()
        .filter_map(|n| state.catalog.get(&n.node_type))
        .map(|e| e.cost_hint_usd)
        .sum();

    let req = DispatchRequest {
        workflow,
        catalog: (*state.catalog).clone(),
        policy,
        trigger_data: payload,
        mode: "live".to_string(),
        triggered_by: Some(format!("webhook:{path}")),
        priority: Priority::Default,
        estimated_cost_usd,
        contract_strict: false,
    };

    match dispatch::dispatch(&state.services, req).await {
        Ok(DispatchOutcome { execution_id, job_id, .. }) => Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "execution_id": execution_id, "job_id": job_id })),
        )),
        Err(err) => Err(status_for(&err)),
    }
}
