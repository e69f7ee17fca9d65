use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("no current usage period for this workspace")]
    NoCurrentPeriod,

    #[error("database error: {0}")]
    Db(#[from] db::DbError),
}
