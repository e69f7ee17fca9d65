pub mod callbacks;
pub mod executions;
pub mod webhooks;
pub mod workflows;

pub use crate::AppState;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Workspace scoping is out of scope for this boundary (no RBAC/auth
/// surface per spec Non-goals); callers identify their workspace via this
/// header the way an authenticated gateway in front of this service would
/// inject it after terminating auth.
pub fn workspace_id(headers: &HeaderMap) -> Option<Uuid> {
    headers.get("x-workspace-id")?.to_str().ok()?.parse().ok()
}
