//! Job payload shape (spec §6): `{workflow_id, execution_id, trigger_data, replay_context?, callback_token}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayContext {
    pub mode: String,
    pub seed: Option<String>,
    pub fixtures: serde_json::Value,
    pub workflow_snapshot: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub workflow_id: Uuid,
    pub execution_id: Uuid,
    pub trigger_data: serde_json::Value,
    #[serde(default)]
    pub replay_context: Option<ReplayContext>,
}

/// Deterministic partition assignment: `hash(workspace_id) mod partitions`.
pub fn partition_for(workspace_id: Uuid, partitions: u32) -> i32 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    workspace_id.hash(&mut hasher);
    (hasher.finish() % partitions as u64) as i32
}
