use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use db::repository::{policies as policy_repo, workflows as wf_repo};
use dispatch::{DispatchError, DispatchOutcome, DispatchRequest};
use queue::Priority;
use serde_json::Value;
use uuid::Uuid;

use super::{workspace_id, AppState};
use crate::convert::{policy_from_row, workflow_from_row};

#[derive(serde::Deserialize)]
pub struct ExecuteWorkflowDto {
    pub input: Value,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(serde::Serialize)]
pub struct ExecuteResponse {
    pub execution_id: Uuid,
    pub job_id: Uuid,
}

pub async fn execute(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<(StatusCode, Json<ExecuteResponse>), StatusCode> {
    let workspace_id = workspace_id(&headers).ok_or(StatusCode::BAD_REQUEST)?;

    let row = wf_repo::get_workflow(&state.services.pool, workspace_id, id)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let workflow = workflow_from_row(&row).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let policy = match policy_repo::get_policy(&state.services.pool, workspace_id).await {
        Ok(Some(row)) => Some(policy_from_row(row).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?),
        Ok(None) => None,
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let priority = match payload.priority.as_deref() {
        Some("high") => Priority::High,
        Some("low") => Priority::Low,
        _ => Priority::Default,
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
        trigger_data: payload.input,
        mode: "live".to_string(),
        triggered_by: None,
        priority,
        estimated_cost_usd,
        contract_strict: false,
    };

    match dispatch::dispatch(&state.services, req).await {
        Ok(DispatchOutcome { execution_id, job_id, .. }) => {
            Ok((StatusCode::ACCEPTED, Json(ExecuteResponse { execution_id, job_id })))
        }
        Err(err) => Err(status_for(&err)),
    }
}

pub fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::WorkflowInactive | DispatchError::WorkflowEmpty => StatusCode::BAD_REQUEST,
        DispatchError::ContractInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::PolicyViolation(_) => StatusCode::FORBIDDEN,
        DispatchError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        DispatchError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
        DispatchError::CallbackUnauthorized(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
