//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "QUILL_LOG";

/// Install the fmt subscriber filtered by `QUILL_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
/// Returns whether this call installed the subscriber.
pub fn init_tracing() -> bool {
    init_tracing_with_default("info")
}

pub fn init_tracing_with_default(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
