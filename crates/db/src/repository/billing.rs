//! Billing repository — usage periods, credit packs, and the transaction ledger.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{CreditPackRow, CreditTransactionRow, WorkspaceUsagePeriodRow},
};

// ---------------------------------------------------------------------------
// workspace_usage_periods
// ---------------------------------------------------------------------------

pub async fn get_current_period(
    pool: &PgPool,
    workspace_id: Uuid,
) -> Result<Option<WorkspaceUsagePeriodRow>, DbError> {
    let row = sqlx::query_as::<_, WorkspaceUsagePeriodRow>(
        r#"SELECT id, workspace_id, subscription_id, period_start, period_end, credits_limit,
                  credits_used, credits_overage, executions_total, executions_succeeded,
                  executions_failed, is_current
           FROM workspace_usage_periods WHERE workspace_id = $1 AND is_current = true"#,
    )
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn open_period(
    pool: &PgPool,
    workspace_id: Uuid,
    subscription_id: Option<Uuid>,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    credits_limit: f64,
) -> Result<WorkspaceUsagePeriodRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, WorkspaceUsagePeriodRow>(
        r#"
        INSERT INTO workspace_usage_periods
            (id, workspace_id, subscription_id, period_start, period_end, credits_limit,
             credits_used, credits_overage, executions_total, executions_succeeded,
             executions_failed, is_current)
        VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, 0, 0, true)
        RETURNING id, workspace_id, subscription_id, period_start, period_end, credits_limit,
                  credits_used, credits_overage, executions_total, executions_succeeded,
                  executions_failed, is_current
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(subscription_id)
    .bind(period_start)
    .bind(period_end)
    .bind(credits_limit)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Close out the current period so a new one can become current.
pub async fn close_period(pool: &PgPool, period_id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE workspace_usage_periods SET is_current = false WHERE id = $1")
        .bind(period_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply a debit (or credit, if `amount` is negative) to a period's running
/// totals. `success` is `None` while the execution is still in flight.
pub async fn record_usage(
    pool: &PgPool,
    period_id: Uuid,
    credits_delta: f64,
    overage_delta: f64,
    success: Option<bool>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE workspace_usage_periods
        SET credits_used = credits_used + $1,
            credits_overage = credits_overage + $2,
            executions_total = executions_total + 1,
            executions_succeeded = executions_succeeded + (CASE WHEN $3 = true THEN 1 ELSE 0 END),
            executions_failed = executions_failed + (CASE WHEN $3 = false THEN 1 ELSE 0 END)
        WHERE id = $4
        "#,
    )
    .bind(credits_delta)
    .bind(overage_delta)
    .bind(success)
    .bind(period_id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// credit_packs
// ---------------------------------------------------------------------------

pub async fn create_pack(
    pool: &PgPool,
    workspace_id: Uuid,
    credits_amount: f64,
    expires_at: Option<DateTime<Utc>>,
) -> Result<CreditPackRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, CreditPackRow>(
        r#"
        INSERT INTO credit_packs (id, workspace_id, credits_amount, credits_remaining, purchased_at, expires_at, status)
        VALUES ($1, $2, $3, $3, $4, $5, 'active')
        RETURNING id, workspace_id, credits_amount, credits_remaining, purchased_at, expires_at, status
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(credits_amount)
    .bind(Utc::now())
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Active packs ordered oldest-first, the order FIFO consumption walks.
pub async fn list_active_packs_fifo(
    pool: &PgPool,
    workspace_id: Uuid,
) -> Result<Vec<CreditPackRow>, DbError> {
    let rows = sqlx::query_as::<_, CreditPackRow>(
        r#"SELECT id, workspace_id, credits_amount, credits_remaining, purchased_at, expires_at, status
           FROM credit_packs
           WHERE workspace_id = $1 AND status = 'active'
           ORDER BY purchased_at ASC"#,
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn debit_pack(pool: &PgPool, pack_id: Uuid, amount: f64) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE credit_packs
        SET credits_remaining = credits_remaining - $1,
            status = CASE WHEN credits_remaining - $1 <= 0 THEN 'exhausted' ELSE status END
        WHERE id = $2
        "#,
    )
    .bind(amount)
    .bind(pack_id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// credit_transactions (append-only ledger)
// ---------------------------------------------------------------------------

pub async fn append_transaction(
    pool: &PgPool,
    workspace_id: Uuid,
    usage_period_id: Uuid,
    transaction_type: &str,
    credits: f64,
    execution_id: Option<Uuid>,
    execution_node_id: Option<Uuid>,
) -> Result<CreditTransactionRow, DbError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, CreditTransactionRow>(
        r#"
        INSERT INTO credit_transactions
            (id, workspace_id, usage_period_id, transaction_type, credits, execution_id, execution_node_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, workspace_id, usage_period_id, transaction_type, credits, execution_id, execution_node_id, created_at
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(usage_period_id)
    .bind(transaction_type)
    .bind(credits)
    .bind(execution_id)
    .bind(execution_node_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Sum of all ledger entries for a period — the value `reconcile()` trusts
/// over the hot in-memory counter.
pub async fn sum_period_ledger(pool: &PgPool, usage_period_id: Uuid) -> Result<f64, DbError> {
    let row: (Option<f64>,) = sqlx::query_as(
        "SELECT SUM(credits) FROM credit_transactions WHERE usage_period_id = $1",
    )
    .bind(usage_period_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0.unwrap_or(0.0))
}
