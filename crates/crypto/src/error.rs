//! Typed error type for the crypto crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("credential not found")]
    NotFound,

    #[error("credential envelope failed to decrypt")]
    DecryptionFailed,

    #[error("unknown key id in envelope: {0}")]
    UnknownKeyId(String),

    #[error("malformed credential envelope")]
    MalformedEnvelope,

    #[error(transparent)]
    Db(#[from] db::DbError),

    #[error(transparent)]
    Cache(#[from] cache::CacheError),
}
