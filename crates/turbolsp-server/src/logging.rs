//! Logging initialization.
//!
//! On an stdio deployment, stdout is the protocol channel — logs must go to
//! stderr or they corrupt the frame stream. This helper wires a
//! `tracing-subscriber` formatter to stderr with `RUST_LOG`-style filtering;
//! embedders with their own subscriber simply skip it.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Idempotent: if a global subscriber is already set (another init call, or
/// a test harness), this is a no-op.
pub fn init_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
