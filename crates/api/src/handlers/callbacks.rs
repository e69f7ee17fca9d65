use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use dispatch::{verify_callback, CallbackBody, CallbackStatus};

use super::AppState;

const TIMESTAMP_HEADER: &str = "x-rusty-timestamp";
const SIGNATURE_HEADER: &str = "x-rusty-signature";

/// Worker→coordinator callback: a worker process reports a job's terminal
/// or progress state, authenticated via HMAC rather than the job id alone.
pub async fn handle_callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let Some(timestamp) = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED;
    };
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED;
    };

    let shared_secret = state.services.callback_shared_secret.as_bytes();
    if verify_callback(&body, timestamp, signature, shared_secret, state.services.config.callback.ttl_seconds).is_err() {
        return StatusCode::UNAUTHORIZED;
    }

    let Ok(callback) = serde_json::from_slice::<CallbackBody>(&body) else {
        return StatusCode::BAD_REQUEST;
    };

    let Ok(job) = state.services.job_queue.get_by_callback_token(&callback.callback_token).await else {
        return StatusCode::UNAUTHORIZED;
    };
    if job.id != callback.job_id {
        return StatusCode::UNAUTHORIZED;
    }

    let result = match callback.status {
        CallbackStatus::Progress => {
            let progress = callback.progress.unwrap_or(0);
            state.services.job_queue.update_progress(job.id, progress).await
        }
        CallbackStatus::Completed => {
            let outcome = db::repository::executions::finish_execution(
                &state.services.pool,
                callback.execution_id,
                "completed",
                callback.nodes.clone(),
                None,
            )
            .await;
            if outcome.is_err() {
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            state
                .services
                .job_queue
                .complete(job.id, callback.nodes.unwrap_or(serde_json::Value::Null))
                .await
        }
        CallbackStatus::Failed => {
            let error = callback.error.clone().unwrap_or_else(|| "unknown worker error".to_string());
            let outcome = db::repository::executions::finish_execution(
                &state.services.pool,
                callback.execution_id,
                "failed",
                None,
                Some(&error),
            )
            .await;
            if outcome.is_err() {
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            state.services.job_queue.fail(job.id, job.max_attempts, &error).await
        }
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
