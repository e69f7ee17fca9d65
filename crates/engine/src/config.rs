//! Runtime configuration (spec.md §4.13, ambient). Loaded from environment
//! variables with hard-coded fallback defaults — no config-file crate, in
//! keeping with the rest of the stack.

use std::env;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Worker pool size per execution.
    pub worker_concurrency: usize,
    /// Per-node deadline, used when a workflow doesn't override it.
    pub default_node_timeout: Duration,
    /// Outer execution deadline, used when a workflow doesn't override it.
    pub default_workflow_timeout: Duration,
    pub default_max_attempts: u32,
    pub default_retry_delay: Duration,
    /// Ceiling on the exponential retry backoff, however many attempts a
    /// workflow's retry settings allow.
    pub max_retry_delay: Duration,
    /// Grace period after cancel before in-flight tasks are hard-killed.
    pub cancel_grace_period: Duration,
    /// Bounded task-queue capacity (backpressure).
    pub task_queue_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: env_or("SCHEDULER_WORKER_CONCURRENCY", 10),
            default_node_timeout: Duration::from_secs(env_or("SCHEDULER_NODE_TIMEOUT_SECONDS", 30)),
            default_workflow_timeout: Duration::from_secs(env_or("SCHEDULER_WORKFLOW_TIMEOUT_SECONDS", 3600)),
            default_max_attempts: env_or("SCHEDULER_MAX_ATTEMPTS", 3),
            default_retry_delay: Duration::from_secs(env_or("SCHEDULER_RETRY_DELAY_SECONDS", 5)),
            max_retry_delay: Duration::from_secs(env_or("SCHEDULER_MAX_RETRY_DELAY_SECONDS", 300)),
            cancel_grace_period: Duration::from_secs(env_or("SCHEDULER_CANCEL_GRACE_SECONDS", 5)),
            task_queue_capacity: env_or("SCHEDULER_TASK_QUEUE_CAPACITY", 256),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub rate_limit_per_minute: u32,
    pub job_queue_partitions: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: env_or("DISPATCH_RATE_LIMIT_PER_MINUTE", 100),
            job_queue_partitions: env_or("DISPATCH_JOB_QUEUE_PARTITIONS", 16),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialCacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CredentialCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(env_or("CREDENTIAL_CACHE_TTL_SECONDS", 300)),
            capacity: env_or("CREDENTIAL_CACHE_CAPACITY", 10_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub retention_days: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { retention_days: env_or("REPLAY_PACK_RETENTION_DAYS", 30) }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// Window, in seconds, within which a callback's timestamp header must
    /// fall to be accepted.
    pub ttl_seconds: i64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self { ttl_seconds: env_or("CALLBACK_TTL_SECONDS", 300) }
    }
}

/// Aggregate of every ambient config section the engine and its callers need.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub dispatch: DispatchConfig,
    pub credential_cache: CredentialCacheConfig,
    pub replay: ReplayConfig,
    pub callback: CallbackConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.worker_concurrency, 10);
        assert_eq!(cfg.scheduler.default_node_timeout, Duration::from_secs(30));
        assert_eq!(cfg.scheduler.default_workflow_timeout, Duration::from_secs(3600));
        assert_eq!(cfg.dispatch.rate_limit_per_minute, 100);
        assert_eq!(cfg.dispatch.job_queue_partitions, 16);
    }
}
