use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReliabilityError {
    #[error("database error: {0}")]
    Db(#[from] db::DbError),
}
