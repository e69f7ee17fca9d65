//! Core domain models for the workflow engine.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory. They serialise to/from the JSONB `definition` column of the
//! `workflows` table (editor-shaped JSON: `{nodes[], edges[]}`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// How a workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Webhook,
    Schedule,
    Event,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::Event => "event",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TriggerType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "webhook" => Ok(Self::Webhook),
            "schedule" => Ok(Self::Schedule),
            "event" => Ok(Self::Event),
            other => Err(format!("unknown trigger type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Node kind / position / definition
// ---------------------------------------------------------------------------

/// The structural role a node plays in the graph. `Condition` nodes gate
/// their downstream edges by `source_handle`; every other kind is routed
/// unconditionally once its upstreams complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Action,
    Condition,
    Ai,
}

/// Editor canvas position. Carried through unchanged; the engine never
/// reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// A single step in the workflow graph, as the editor emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique identifier within this workflow (referenced by edges).
    pub id: String,
    /// Maps to a registered `NodeExecutor` implementation / catalog entry.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_node_kind")]
    pub node_kind: NodeKind,
    #[serde(default)]
    pub position: Option<Position>,
    pub data: NodeData,
}

fn default_node_kind() -> NodeKind {
    NodeKind::Action
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed edge from one node to another, as the editor emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Non-empty branch tag on a condition node's outgoing edges.
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
    /// Opaque CEL-like predicate. The core never evaluates this itself —
    /// it is evaluated by the NodeExecutor on the source side, which folds
    /// the result into the node's `{output: "<handle>"}` payload.
    #[serde(default)]
    pub condition: Option<String>,
}

// ---------------------------------------------------------------------------
// Retry / timeout settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySettings {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_seconds: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 3, delay_seconds: 5 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Outer execution deadline, in seconds.
    pub workflow_seconds: u64,
    /// Per-node deadline, in seconds.
    pub node_seconds: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { workflow_seconds: 3600, node_seconds: 30 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub timeout: TimeoutSettings,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A complete workflow definition (the JSON stored in `workflows.definition`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub is_locked: bool,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: serde_json::Value,
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub settings: WorkflowSettings,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workspace_id: Uuid,
        name: impl Into<String>,
        trigger_type: TriggerType,
        nodes: Vec<NodeDefinition>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            is_active: true,
            is_locked: false,
            trigger_type,
            trigger_config: serde_json::Value::Null,
            nodes,
            edges,
            settings: WorkflowSettings::default(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Node catalog
// ---------------------------------------------------------------------------

/// A registered node type's capability description, used by the contract
/// compiler (C4) and policy engine (C5). Concrete node implementations
/// live in the `nodes` crate; this is purely descriptive metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub node_type: String,
    pub node_kind: NodeKind,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub config_schema: serde_json::Value,
    pub credential_type: Option<String>,
    pub cost_hint_usd: f64,
    pub latency_hint_ms: u64,
}

/// Lookup table of catalog entries by `node_type`.
pub type NodeCatalog = HashMap<String, CatalogEntry>;
