//! Tracing setup for the CLI
//!
//! Diagnostics go to stderr only: stdout carries exactly one JSON object per
//! run and is often piped into other tooling.

use tracing_subscriber::EnvFilter;

/// Initialize logging; level comes from `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once (later calls are ignored), which keeps tests
/// that exercise command paths from panicking.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .try_init();
}
