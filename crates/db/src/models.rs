//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour.
//! Domain types (with validation, invariants, business methods) live in
//! the crates that own each concern (`engine`, `crypto`, `replay`,
//! `reliability`, `billing`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

/// A persisted workflow definition row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub is_locked: bool,
    pub trigger_type: String,
    /// Full JSON workflow definition (nodes, edges, settings).
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An immutable snapshot of a workflow at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowVersionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub version_number: i32,
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// credentials
// ---------------------------------------------------------------------------

/// A persisted, still-encrypted credential row. Plaintext never lands here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub credential_type: String,
    /// `base64(aead_seal(master_key, nonce, plaintext_json))`.
    pub data_encrypted: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// workflow_executions / execution_nodes / execution_logs
// ---------------------------------------------------------------------------

/// Possible statuses for a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Waiting,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "waiting" => Ok(Self::Waiting),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "timed_out" => Ok(Self::TimedOut),
            other => Err(format!("unknown execution status: {other}")),
        }
    }
}

/// How an execution was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Manual,
    Schedule,
    Webhook,
    Retry,
    Replay,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Schedule => "schedule",
            Self::Webhook => "webhook",
            Self::Retry => "retry",
            Self::Replay => "replay",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "schedule" => Ok(Self::Schedule),
            "webhook" => Ok(Self::Webhook),
            "retry" => Ok(Self::Retry),
            "replay" => Ok(Self::Replay),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// A persisted workflow execution row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub workspace_id: Uuid,
    pub status: String,
    pub mode: String,
    pub triggered_by: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub trigger_data: serde_json::Value,
    pub result_data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub attempt: i32,
    pub max_attempts: i32,
    pub parent_execution_id: Option<Uuid>,
    pub replay_of_execution_id: Option<Uuid>,
    pub is_deterministic_replay: bool,
    pub estimated_cost_usd: Option<f64>,
}

/// A persisted node execution row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionNodeRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub node_id: String,
    pub node_type: String,
    pub status: String,
    pub sequence: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// An append-only execution log line.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionLogRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub execution_node_id: Option<Uuid>,
    pub level: String,
    pub message: String,
    pub context: serde_json::Value,
    pub logged_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// connector reliability
// ---------------------------------------------------------------------------

/// A single recorded connector call attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectorCallAttemptRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub execution_node_id: Option<Uuid>,
    pub workspace_id: Uuid,
    pub workflow_id: Uuid,
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
    pub happened_at: DateTime<Utc>,
}

/// One day's rollup of attempts for a `(workspace, connector, operation)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectorMetricDailyRow {
    pub workspace_id: Uuid,
    pub connector_key: String,
    pub connector_operation: String,
    pub day: DateTime<Utc>,
    pub total: i32,
    pub success: i32,
    pub failure: i32,
    pub retry: i32,
    pub timeout: i32,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

/// The durable bundle needed to reproduce an execution deterministically.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionReplayPackRow {
    pub execution_id: Uuid,
    pub workspace_id: Uuid,
    pub workflow_id: Uuid,
    pub source_execution_id: Option<Uuid>,
    pub mode: String,
    pub deterministic_seed: i64,
    pub workflow_snapshot: serde_json::Value,
    pub trigger_snapshot: serde_json::Value,
    pub fixtures: serde_json::Value,
    pub environment_snapshot: serde_json::Value,
    pub captured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// contract snapshots
// ---------------------------------------------------------------------------

/// A content-addressed verdict on a workflow graph's static validity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowContractSnapshotRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub workflow_version_id: Option<Uuid>,
    pub graph_hash: String,
    pub status: String,
    pub contracts: serde_json::Value,
    pub issues: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// execution runbooks
// ---------------------------------------------------------------------------

/// Operator-facing remediation steps synthesised from a failed node.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionRunbookRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub node_id: String,
    pub severity: String,
    pub status: String,
    pub steps: serde_json::Value,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkspacePolicyRow {
    pub workspace_id: Uuid,
    pub enabled: bool,
    pub allowed_node_types: serde_json::Value,
    pub blocked_node_types: serde_json::Value,
    pub allowed_ai_models: serde_json::Value,
    pub blocked_ai_models: serde_json::Value,
    pub max_execution_cost_usd: Option<f64>,
    pub max_ai_tokens: Option<i64>,
    pub redaction_rules: serde_json::Value,
}

// ---------------------------------------------------------------------------
// billing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkspaceUsagePeriodRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub credits_limit: f64,
    pub credits_used: f64,
    pub credits_overage: f64,
    pub executions_total: i64,
    pub executions_succeeded: i64,
    pub executions_failed: i64,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditPackStatus {
    Active,
    Exhausted,
    Refunded,
}

impl std::fmt::Display for CreditPackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CreditPackStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "exhausted" => Ok(Self::Exhausted),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown credit pack status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditPackRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub credits_amount: f64,
    pub credits_remaining: f64,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransactionRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub usage_period_id: Uuid,
    pub transaction_type: String,
    /// Signed: positive for usage, negative for refunds/grants.
    pub credits: f64,
    pub execution_id: Option<Uuid>,
    pub execution_node_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// job_queue
// ---------------------------------------------------------------------------

/// Possible statuses for a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    DeadLettered,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::DeadLettered => "dead_lettered",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "dead_lettered" => Ok(Self::DeadLettered),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A job row fetched from the queue table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub workflow_id: Uuid,
    pub partition: i32,
    pub priority: String,
    pub callback_token: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub progress: i32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
