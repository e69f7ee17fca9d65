//! The composition root: one `Services` struct holding `Arc` handles to
//! every shared collaborator, constructed once in the `cli` binary's
//! `main`.

use std::sync::Arc;

use db::DbPool;

use crate::rate_limit::RateLimiter;

pub struct Services {
    pub pool: DbPool,
    pub job_queue: Arc<dyn queue::JobQueue>,
    pub credentials: Arc<crypto::Resolver>,
    pub meter: Arc<billing::Meter>,
    pub rate_limiter: Arc<RateLimiter>,
    pub registry: Arc<observability::Registry>,
    pub config: engine::Config,
    /// Shared secret for HMAC-verifying worker→coordinator callbacks.
    pub callback_shared_secret: String,
}

impl Services {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: DbPool,
        job_queue: Arc<dyn queue::JobQueue>,
        credentials: Arc<crypto::Resolver>,
        meter: Arc<billing::Meter>,
        registry: Arc<observability::Registry>,
        config: engine::Config,
        callback_shared_secret: String,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.dispatch.rate_limit_per_minute));
        Self { pool, job_queue, credentials, meter, rate_limiter, registry, config, callback_shared_secret }
    }
}
