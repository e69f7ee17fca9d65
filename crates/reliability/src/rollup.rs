//! `rollup_daily` (spec.md §4.9) — atomically upsert a `ConnectorMetricDaily`
//! per `(connector_key, connector_operation)` group for a given day.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use db::models::ConnectorMetricDailyRow;
use db::DbPool;
use uuid::Uuid;

use crate::error::ReliabilityError;
use crate::percentile::nearest_rank;

pub async fn rollup_daily(pool: &DbPool, workspace_id: Uuid, day: DateTime<Utc>) -> Result<Vec<ConnectorMetricDailyRow>, ReliabilityError> {
    let since = day;
    let until = day + Duration::days(1);
    let attempts = db::repository::connector_attempts::list_attempts_in_range(pool, workspace_id, since, until).await?;

    let mut by_group: HashMap<(String, String), Vec<i64>> = HashMap::new();
    let mut counts: HashMap<(String, String), (i32, i32, i32, i32, i32)> = HashMap::new();

    for attempt in &attempts {
        let key = (attempt.connector_key.clone(), attempt.connector_operation.clone());
        if let Some(d) = attempt.duration_ms {
            by_group.entry(key.clone()).or_default().push(d);
        }
        let entry = counts.entry(key).or_insert((0, 0, 0, 0, 0));
        entry.0 += 1;
        match attempt.status.as_str() {
            "success" => entry.1 += 1,
            "failure" => entry.2 += 1,
            "timeout" => entry.4 += 1,
            _ => {}
        }
        if attempt.is_retry {
            entry.3 += 1;
        }
    }

    let mut rows = Vec::with_capacity(counts.len());
    for (key, (total, success, failure, retry, timeout)) in counts {
        let durations = by_group.get(&key).cloned().unwrap_or_default();
        let row = ConnectorMetricDailyRow {
            workspace_id,
            connector_key: key.0,
            connector_operation: key.1,
            day,
            total,
            success,
            failure,
            retry,
            timeout,
            p50_ms: nearest_rank(&durations, 50.0),
            p95_ms: nearest_rank(&durations, 95.0),
            p99_ms: nearest_rank(&durations, 99.0),
        };
        db::repository::connector_attempts::upsert_daily_rollup(pool, &row).await?;
        rows.push(row);
    }

    Ok(rows)
}
