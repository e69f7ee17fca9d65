use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use db::repository::workflows as wf_repo;
use engine::Workflow;
use uuid::Uuid;

use super::{workspace_id, AppState};
use crate::convert::definition_of;

pub async fn list(headers: HeaderMap, State(state): State<AppState>) -> Result<Json<Vec<db::models::WorkflowRow>>, StatusCode> {
    let workspace_id = workspace_id(&headers).ok_or(StatusCode::BAD_REQUEST)?;
    match wf_repo::list_workflows(&state.services.pool, workspace_id).await {
        Ok(workflows) => Ok(Json(workflows)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn get(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<db::models::WorkflowRow>, StatusCode> {
    let workspace_id = workspace_id(&headers).ok_or(StatusCode::BAD_REQUEST)?;
    match wf_repo::get_workflow(&state.services.pool, workspace_id, id).await {
        Ok(wf) => Ok(Json(wf)),
        Err(db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn create(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> Result<(StatusCode, Json<db::models::WorkflowRow>), StatusCode> {
    let workspace_id = workspace_id(&headers).ok_or(StatusCode::BAD_REQUEST)?;
    if workflow.workspace_id != workspace_id {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = engine::compile(workflow.id, None, &workflow.nodes, &workflow.edges, &state.catalog, false);
    if snapshot.status == engine::ContractStatus::Invalid {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match wf_repo::create_workflow(
        &state.services.pool,
        workspace_id,
        &workflow.name,
        &workflow.trigger_type.to_string(),
        definition_of(&workflow),
    )
    .await
    {
        Ok(wf) => Ok((StatusCode::CREATED, Json(wf))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn delete(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, StatusCode> {
    let workspace_id = workspace_id(&headers).ok_or(StatusCode::BAD_REQUEST)?;
    match wf_repo::delete_workflow(&state.services.pool, workspace_id, id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
