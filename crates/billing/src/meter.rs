//! Credit Meter (spec C10) — a hot atomic counter per workspace, backed by
//! an append-only ledger and periodic reconcile.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::DbPool;
use observability::Gauge;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::BillingError;

pub const TXN_USAGE: &str = "usage";
pub const TXN_GRANT: &str = "grant";
pub const TXN_REFUND: &str = "refund";

/// Process-wide hot counters, one `Gauge` per workspace, backed by the
/// durable ledger in `db`.
pub struct Meter {
    pool: DbPool,
    counters: RwLock<HashMap<Uuid, Arc<Gauge>>>,
}

impl Meter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, counters: RwLock::new(HashMap::new()) }
    }

    async fn counter_for(&self, workspace_id: Uuid) -> Arc<Gauge> {
        if let Some(g) = self.counters.read().await.get(&workspace_id) {
            return g.clone();
        }
        let mut guard = self.counters.write().await;
        guard.entry(workspace_id).or_insert_with(|| Arc::new(Gauge::new())).clone()
    }

    /// `increment(workspace, credits, type)`: bump the hot counter, append a
    /// ledger transaction, and roll the period's aggregate usage counters.
    pub async fn increment(
        &self,
        workspace_id: Uuid,
        credits: f64,
        transaction_type: &str,
        execution_id: Option<Uuid>,
        execution_node_id: Option<Uuid>,
        success: Option<bool>,
    ) -> Result<(), BillingError> {
        let period = db::repository::billing::get_current_period(&self.pool, workspace_id)
            .await?
            .ok_or(BillingError::NoCurrentPeriod)?;

        let counter = self.counter_for(workspace_id).await;
        counter.add(credits);

        db::repository::billing::append_transaction(
            &self.pool,
            workspace_id,
            period.id,
            transaction_type,
            credits,
            execution_id,
            execution_node_id,
        )
        .await?;

        let new_used = period.credits_used + credits;
        let overage_delta = if new_used > period.credits_limit {
            (new_used - period.credits_limit).max(0.0) - period.credits_overage.max(0.0)
        } else {
            0.0
        };
        db::repository::billing::record_usage(&self.pool, period.id, credits, overage_delta.max(0.0), success).await?;

        Ok(())
    }

    /// `remaining(workspace) = max(0, limit - used) + active_pack_credits`.
    pub async fn remaining(&self, workspace_id: Uuid) -> Result<f64, BillingError> {
        let period = db::repository::billing::get_current_period(&self.pool, workspace_id)
            .await?
            .ok_or(BillingError::NoCurrentPeriod)?;

        let packs = db::repository::billing::list_active_packs_fifo(&self.pool, workspace_id).await?;
        let pack_credits: f64 = packs.iter().map(|p| p.credits_remaining.max(0.0)).sum();

        Ok((period.credits_limit - period.credits_used).max(0.0) + pack_credits)
    }

    /// `consume_pack_credits(workspace, n)` — iterate active packs FIFO by
    /// `purchased_at`, consuming up to `n` credits; a pack that hits zero
    /// transitions to `exhausted`.
    pub async fn consume_pack_credits(&self, workspace_id: Uuid, n: f64) -> Result<f64, BillingError> {
        let packs = db::repository::billing::list_active_packs_fifo(&self.pool, workspace_id).await?;
        let mut remaining_to_consume = n;

        for pack in packs {
            if remaining_to_consume <= 0.0 {
                break;
            }
            let take = remaining_to_consume.min(pack.credits_remaining.max(0.0));
            if take <= 0.0 {
                continue;
            }
            db::repository::billing::debit_pack(&self.pool, pack.id, take).await?;
            remaining_to_consume -= take;
        }

        Ok(n - remaining_to_consume)
    }

    /// `create_period(workspace, start, end, limit, sub?)` — close the
    /// current period, open a new current one, and reset the hot counter.
    pub async fn create_period(
        &self,
        workspace_id: Uuid,
        subscription_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        credits_limit: f64,
    ) -> Result<Uuid, BillingError> {
        if let Some(current) = db::repository::billing::get_current_period(&self.pool, workspace_id).await? {
            db::repository::billing::close_period(&self.pool, current.id).await?;
        }
        let period = db::repository::billing::open_period(&self.pool, workspace_id, subscription_id, start, end, credits_limit).await?;
        self.counter_for(workspace_id).await.set(0.0);
        Ok(period.id)
    }

    /// `reconcile(workspace)` — recompute `credits_used` from the ledger and
    /// overwrite the hot counter. The ledger is the source of truth.
    pub async fn reconcile(&self, workspace_id: Uuid) -> Result<f64, BillingError> {
        let period = db::repository::billing::get_current_period(&self.pool, workspace_id)
            .await?
            .ok_or(BillingError::NoCurrentPeriod)?;
        let total = db::repository::billing::sum_period_ledger(&self.pool, period.id).await?;
        self.counter_for(workspace_id).await.set(total);
        Ok(total)
    }

    /// `add_credits(workspace, n, type, desc)` — a negative-signed
    /// transaction that decrements the counter (a grant or refund).
    pub async fn add_credits(&self, workspace_id: Uuid, n: f64, transaction_type: &str) -> Result<(), BillingError> {
        self.increment(workspace_id, -n.abs(), transaction_type, None, None, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_pack_credits_math_is_sane() {
        // Pure arithmetic sanity check without a live pool: FIFO consumption
        // never returns more than requested.
        let requested: f64 = 10.0;
        let available = vec![4.0, 10.0];
        let mut remaining = requested;
        let mut consumed = 0.0;
        for credits in available {
            if remaining <= 0.0 {
                break;
            }
            let take = remaining.min(credits);
            consumed += take;
            remaining -= take;
        }
        assert_eq!(consumed, requested);
    }
}
