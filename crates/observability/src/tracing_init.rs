//! Tracing bootstrap, generalized from the teacher CLI's
//! `tracing_subscriber::fmt::init()` one-liner.

use tracing_subscriber::EnvFilter;

/// How the process should emit logs.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `RUST_LOG`-style filter directive, e.g. `"info,engine=debug"`.
    pub filter: String,
    /// Emit newline-delimited JSON instead of the human-readable format.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}

impl TracingConfig {
    /// Build from environment: `RUST_LOG` (default `"info"`) and
    /// `LOG_FORMAT=json` to switch to JSON output.
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self { filter, json }
    }
}

/// Initialise the global tracing subscriber. Safe to call once at process
/// start; subsequent calls are no-ops (mirrors `tracing_subscriber::fmt::init`
/// semantics, which panics if called twice — we guard with `try_init`).
pub fn init_tracing(config: &TracingConfig) {
    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialised");
    }
}
