//! Subscriber setup for binaries and tests embedding filehop.
//!
//! The engine crates log through the `log` facade; the subscriber installed
//! here also captures those records, so one filter governs both.

use tracing_subscriber::EnvFilter;

/// Install a human-readable subscriber. `RUST_LOG` wins over
/// `default_filter`. Returns `false` if a global subscriber already exists.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_filter))
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Same as [`init`] but emits one JSON object per event.
pub fn init_json(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_filter))
        .try_init()
        .is_ok()
}

fn filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}
