//! `JobQueue` — the boundary between Dispatch (C7) and the Scheduler's
//! worker fleet. Generalizes the Postgres-table-backed queue into a trait
//! so callers (and tests) aren't tied to a live database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::QueueError;
use crate::payload::JobPayload;
use crate::priority::Priority;
use db::models::JobRow;

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(
        &self,
        workflow_id: Uuid,
        execution_id: Uuid,
        partition: i32,
        priority: Priority,
        callback_token: &str,
        max_attempts: i32,
        payload: JobPayload,
    ) -> Result<JobRow, QueueError>;

    /// Atomically claim the next pending job in `partition`, highest
    /// priority and oldest first. `None` if the partition is empty.
    async fn fetch_next(&self, partition: i32) -> Result<Option<JobRow>, QueueError>;

    async fn update_progress(&self, job_id: Uuid, progress: i32) -> Result<(), QueueError>;

    async fn complete(&self, job_id: Uuid, result: serde_json::Value) -> Result<(), QueueError>;

    async fn fail(&self, job_id: Uuid, max_attempts: i32, error: &str) -> Result<(), QueueError>;

    async fn get(&self, job_id: Uuid) -> Result<JobRow, QueueError>;

    async fn get_by_callback_token(&self, token: &str) -> Result<JobRow, QueueError>;
}
