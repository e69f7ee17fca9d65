//! Live metrics grouping and the quality-score formula (spec.md §4.9).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use db::models::ConnectorCallAttemptRow;
use db::DbPool;
use uuid::Uuid;

use crate::error::ReliabilityError;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GroupMetrics {
    pub total: u32,
    pub success: u32,
    pub failure: u32,
    pub retry: u32,
    pub timeout: u32,
    pub success_rate: f64,
    pub retry_rate: f64,
    pub avg_latency_ms: f64,
    pub quality_score: f64,
}

fn clip(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// `quality_score = clip(success_rate*0.8 - retry_rate*0.2 - min(30, avg_latency_ms/200), 0, 100)`.
pub fn quality_score(success_rate: f64, retry_rate: f64, avg_latency_ms: f64) -> f64 {
    clip(success_rate * 0.8 - retry_rate * 0.2 - (30.0_f64).min(avg_latency_ms / 200.0), 0.0, 100.0)
}

/// Group attempts by `(connector_key, connector_operation)` and compute
/// `GroupMetrics` for each.
pub fn group_metrics(attempts: &[ConnectorCallAttemptRow]) -> HashMap<(String, String), GroupMetrics> {
    let mut groups: HashMap<(String, String), Vec<&ConnectorCallAttemptRow>> = HashMap::new();
    for a in attempts {
        groups.entry((a.connector_key.clone(), a.connector_operation.clone())).or_default().push(a);
    }

    groups
        .into_iter()
        .map(|(key, rows)| {
            let total = rows.len() as u32;
            let success = rows.iter().filter(|r| r.status == "success").count() as u32;
            let failure = rows.iter().filter(|r| r.status == "failure").count() as u32;
            let timeout = rows.iter().filter(|r| r.status == "timeout").count() as u32;
            let retry = rows.iter().filter(|r| r.is_retry).count() as u32;

            let success_rate = if total > 0 { success as f64 / total as f64 * 100.0 } else { 0.0 };
            let retry_rate = if total > 0 { retry as f64 / total as f64 * 100.0 } else { 0.0 };
            let durations: Vec<i64> = rows.iter().filter_map(|r| r.duration_ms).collect();
            let avg_latency_ms = if durations.is_empty() {
                0.0
            } else {
                durations.iter().sum::<i64>() as f64 / durations.len() as f64
            };

            let metrics = GroupMetrics {
                total,
                success,
                failure,
                retry,
                timeout,
                success_rate,
                retry_rate,
                avg_latency_ms,
                quality_score: quality_score(success_rate, retry_rate, avg_latency_ms),
            };
            (key, metrics)
        })
        .collect()
}

/// `metrics(workspace, filters)` — group live attempts in `[since, until)`
/// by `(connector_key, connector_operation)`.
pub async fn live_metrics(
    pool: &DbPool,
    workspace_id: Uuid,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<HashMap<(String, String), GroupMetrics>, ReliabilityError> {
    let attempts = db::repository::connector_attempts::list_attempts_in_range(pool, workspace_id, since, until).await?;
    Ok(group_metrics(&attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_record_scores_eighty() {
        assert_eq!(quality_score(100.0, 0.0, 0.0), 80.0);
    }

    #[test]
    fn high_latency_is_capped_at_thirty_point_penalty() {
        let score = quality_score(100.0, 0.0, 100_000.0);
        assert_eq!(score, 50.0);
    }

    #[test]
    fn score_never_goes_negative() {
        let score = quality_score(0.0, 100.0, 100_000.0);
        assert_eq!(score, 0.0);
    }
}
