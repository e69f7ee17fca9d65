//! `ingest` (spec.md §4.9) — write one `ConnectorCallAttempt` per attempt
//! record, correlating `node_id -> execution_node.id` via a lookup built
//! once per call.

use std::collections::HashMap;

use db::DbPool;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReliabilityError;

/// One connector call as reported by a node's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub node_id: String,
    pub connector_key: String,
    pub connector_operation: String,
    pub provider: Option<String>,
    pub attempt_no: i32,
    pub is_retry: bool,
    pub status: String,
    pub status_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub request_fingerprint: String,
    pub idempotency_key: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Persist every attempt in `attempts`, resolving each `node_id` to its
/// `execution_node_id` once via `list_execution_nodes`.
pub async fn ingest(
    pool: &DbPool,
    workspace_id: Uuid,
    workflow_id: Uuid,
    execution_id: Uuid,
    attempts: &[AttemptRecord],
) -> Result<(), ReliabilityError> {
    let nodes = db::repository::executions::list_execution_nodes(pool, execution_id).await?;
    let node_lookup: HashMap<&str, Uuid> = nodes.iter().map(|n| (n.node_id.as_str(), n.id)).collect();

    for attempt in attempts {
        let execution_node_id = node_lookup.get(attempt.node_id.as_str()).copied();
        db::repository::connector_attempts::insert_attempt(
            pool,
            execution_id,
            execution_node_id,
            workspace_id,
            workflow_id,
            &attempt.connector_key,
            &attempt.connector_operation,
            attempt.provider.as_deref(),
            attempt.attempt_no,
            attempt.is_retry,
            &attempt.status,
            attempt.status_code,
            attempt.duration_ms,
            &attempt.request_fingerprint,
            attempt.idempotency_key.as_deref(),
            attempt.error_code.as_deref(),
            attempt.error_message.as_deref(),
        )
        .await?;
    }

    Ok(())
}
