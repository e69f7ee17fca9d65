use thiserror::Error;

/// Stable machine-readable codes, mirrored from `EngineError::code()` plus
/// dispatch's own gate failures (spec.md §7).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("workflow is not active")]
    WorkflowInactive,

    #[error("workflow has no nodes")]
    WorkflowEmpty,

    #[error("contract invalid: {0} issue(s)")]
    ContractInvalid(usize),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: f64, available: f64 },

    #[error("callback unauthorized: {0}")]
    CallbackUnauthorized(&'static str),

    #[error("database error: {0}")]
    Db(#[from] db::DbError),

    #[error("queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("billing error: {0}")]
    Billing(#[from] billing::BillingError),

    #[error("replay error: {0}")]
    Replay(#[from] replay::ReplayError),

    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::WorkflowInactive | Self::WorkflowEmpty => "VALIDATION_ERROR",
            Self::ContractInvalid(_) => "CONTRACT_INVALID",
            Self::PolicyViolation(_) => "POLICY_NODE_BLOCKED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            Self::CallbackUnauthorized(_) => "UNAUTHORIZED",
            Self::Db(_) => "INTERNAL_ERROR",
            Self::Queue(_) => "INTERNAL_ERROR",
            Self::Billing(_) => "INTERNAL_ERROR",
            Self::Replay(_) => "INTERNAL_ERROR",
            Self::Crypto(_) => "INTERNAL_ERROR",
        }
    }
}
