//! Glue (spec C12) — runbook synthesiser and cost estimator. Derives
//! operator-facing artifacts from execution state; no persistence of its
//! own, callers write the results through `db`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runbook {
    pub severity: Severity,
    pub status: &'static str,
    pub steps: Vec<&'static str>,
}

const AUTH_KEYWORDS: &[&str] = &["auth", "permission", "unauthorized", "forbidden", "401", "403"];
const RATE_KEYWORDS: &[&str] = &["timeout", "rate limit", "429", "throttle"];

const AUTH_STEPS: &[&str] = &[
    "Verify the credential used by this workflow has not expired or been revoked.",
    "Check the connector's required OAuth scopes against the workspace's grant.",
    "Re-run with a refreshed credential before retrying the workflow.",
];
const RATE_STEPS: &[&str] = &[
    "Check the connector's current rate limit window and quota usage.",
    "Reduce workflow concurrency or stagger the trigger schedule.",
    "Retry after the backoff window has elapsed.",
];
const GENERIC_STEPS: &[&str] = &[
    "Inspect the failing node's execution log for the underlying error.",
    "Confirm the node's input matches its expected schema.",
    "Re-run the execution once the root cause is addressed.",
];

/// Synthesise a runbook from a failure's error message. Severity is derived
/// from keyword matches: auth/permission keywords are `critical`,
/// timeout/rate-limit keywords are `high`, everything else is `medium`.
pub fn synthesize_runbook(error_message: &str) -> Runbook {
    let lower = error_message.to_lowercase();

    if AUTH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Runbook { severity: Severity::Critical, status: "open", steps: AUTH_STEPS.to_vec() };
    }
    if RATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Runbook { severity: Severity::High, status: "open", steps: RATE_STEPS.to_vec() };
    }
    Runbook { severity: Severity::Medium, status: "open", steps: GENERIC_STEPS.to_vec() }
}

/// Base USD cost per connector class, before the retry discount.
fn base_cost_for_class(connector_class: &str) -> f64 {
    match connector_class {
        "ai" => 0.02,
        "http" => 0.0005,
        "database" => 0.0002,
        _ => 0.0001,
    }
}

/// One connector attempt's contribution to an execution's estimated cost.
pub struct AttemptCost {
    pub connector_class: String,
    pub is_retry: bool,
}

/// Sum per-attempt base cost by connector class; retries are discounted to
/// 0.8x since they reuse most of the original call's context.
pub fn estimate_execution_cost(attempts: &[AttemptCost]) -> f64 {
    attempts
        .iter()
        .map(|a| {
            let base = base_cost_for_class(&a.connector_class);
            if a.is_retry { base * 0.8 } else { base }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_keyword_yields_critical_severity() {
        let runbook = synthesize_runbook("request failed: 401 Unauthorized");
        assert_eq!(runbook.severity, Severity::Critical);
    }

    #[test]
    fn rate_limit_keyword_yields_high_severity() {
        let runbook = synthesize_runbook("upstream returned 429 rate limit exceeded");
        assert_eq!(runbook.severity, Severity::High);
    }

    #[test]
    fn unknown_error_yields_medium_severity() {
        let runbook = synthesize_runbook("unexpected null pointer in transform step");
        assert_eq!(runbook.severity, Severity::Medium);
    }

    #[test]
    fn retries_are_discounted() {
        let attempts = vec![
            AttemptCost { connector_class: "http".into(), is_retry: false },
            AttemptCost { connector_class: "http".into(), is_retry: true },
        ];
        let cost = estimate_execution_cost(&attempts);
        assert!((cost - (0.0005 + 0.0005 * 0.8)).abs() < 1e-9);
    }
}
