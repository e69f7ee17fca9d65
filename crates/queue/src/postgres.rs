//! Postgres-backed `JobQueue`, wrapping `db::repository::jobs`.

use async_trait::async_trait;
use db::{models::JobRow, DbPool};
use uuid::Uuid;

use crate::error::QueueError;
use crate::payload::JobPayload;
use crate::priority::Priority;
use crate::traits::JobQueue;

pub struct PostgresJobQueue {
    pool: DbPool,
}

impl PostgresJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue(
        &self,
        workflow_id: Uuid,
        execution_id: Uuid,
        partition: i32,
        priority: Priority,
        callback_token: &str,
        max_attempts: i32,
        payload: JobPayload,
    ) -> Result<JobRow, QueueError> {
        let payload_json = serde_json::to_value(payload).expect("JobPayload always serialises");
        let row = db::repository::jobs::enqueue_job(
            &self.pool,
            execution_id,
            workflow_id,
            partition,
            priority.as_db_str(),
            callback_token,
            max_attempts,
            payload_json,
        )
        .await?;
        Ok(row)
    }

    async fn fetch_next(&self, partition: i32) -> Result<Option<JobRow>, QueueError> {
        Ok(db::repository::jobs::fetch_next_job(&self.pool, partition).await?)
    }

    async fn update_progress(&self, job_id: Uuid, progress: i32) -> Result<(), QueueError> {
        Ok(db::repository::jobs::update_progress(&self.pool, job_id, progress).await?)
    }

    async fn complete(&self, job_id: Uuid, result: serde_json::Value) -> Result<(), QueueError> {
        Ok(db::repository::jobs::complete_job(&self.pool, job_id, result).await?)
    }

    async fn fail(&self, job_id: Uuid, max_attempts: i32, error: &str) -> Result<(), QueueError> {
        Ok(db::repository::jobs::fail_job(&self.pool, job_id, max_attempts, error).await?)
    }

    async fn get(&self, job_id: Uuid) -> Result<JobRow, QueueError> {
        Ok(db::repository::jobs::get_job(&self.pool, job_id).await?)
    }

    async fn get_by_callback_token(&self, token: &str) -> Result<JobRow, QueueError> {
        Ok(db::repository::jobs::get_by_callback_token(&self.pool, token).await?)
    }
}
