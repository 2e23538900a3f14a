//! Diagnostic logging setup for the `ragdoc` binary.
//!
//! The filter comes from `RAGDOC_LOG`, then `RUST_LOG`, defaulting to
//! `warn`. Events go to stderr so stdout stays a clean JSONL stream.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RAGDOC_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
