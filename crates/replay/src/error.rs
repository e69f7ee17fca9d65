use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("database error: {0}")]
    Db(#[from] db::DbError),

    #[error("queue error: {0}")]
    Queue(#[from] queue::QueueError),
}
