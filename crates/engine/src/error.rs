//! Engine-level error types, with a stable `code()` for every user-surfaced
//! variant (spec.md §7).

use thiserror::Error;

/// Errors produced by the workflow engine (DAG validation, contract
/// compilation, policy evaluation, and scheduling).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ DAG validation (C3) ------
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    #[error("edge '{edge_id}' references unknown node '{node_id}' ({side} side)")]
    InvalidEdge {
        edge_id: String,
        node_id: String,
        side: &'static str,
    },

    #[error("workflow has no entry node (every node has non-zero in-degree)")]
    NoEntry,

    #[error("workflow graph contains a cycle")]
    CycleDetected,

    // ------ Contract compiler (C4) ------
    #[error("type mismatch on edge {edge_id}: {source_type} != {target_type}")]
    TypeMismatch {
        edge_id: String,
        source_type: String,
        target_type: String,
    },

    #[error("missing required field '{field}' on edge {edge_id}")]
    MissingRequiredField { edge_id: String, field: String },

    // ------ Policy engine (C5) ------
    #[error("node type '{0}' is blocked by workspace policy")]
    PolicyNodeBlocked(String),

    #[error("estimated execution cost exceeds workspace policy cap")]
    PolicyCostExceeded,

    // ------ Scheduler (C6) ------
    #[error("node '{node_id}' failed fatally: {message}")]
    NodeFatal { node_id: String, message: String },

    #[error("node '{node_id}' exceeded retry limit: {message}")]
    NodeRetryExhausted { node_id: String, message: String },

    #[error("node '{0}' timed out")]
    NodeTimeout(String),

    #[error("workflow execution exceeded its deadline")]
    WorkflowTimeout,

    #[error("execution was cancelled")]
    Cancelled,

    #[error("no implementation registered for node_type '{0}'")]
    UnknownNodeType(String),

    // ------ Persistence ------
    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}

impl EngineError {
    /// Stable machine-readable code for user-surfaced errors (spec.md §7).
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateNodeId(_) => "DUPLICATE_NODE_ID",
            Self::InvalidEdge { .. } => "INVALID_EDGE",
            Self::NoEntry => "NO_ENTRY_NODE",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::PolicyNodeBlocked(_) => "POLICY_NODE_BLOCKED",
            Self::PolicyCostExceeded => "POLICY_COST_EXCEEDED",
            Self::NodeFatal { .. } => "NODE_FATAL",
            Self::NodeRetryExhausted { .. } => "NODE_RETRY_EXHAUSTED",
            Self::NodeTimeout(_) => "NODE_TIMEOUT",
            Self::WorkflowTimeout => "WORKFLOW_TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::UnknownNodeType(_) => "UNKNOWN_NODE_TYPE",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}
