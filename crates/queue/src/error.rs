use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job {0} not found")]
    NotFound(uuid::Uuid),

    #[error("database error: {0}")]
    Db(#[from] db::DbError),
}
