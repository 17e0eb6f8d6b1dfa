//! Tracing setup for the `rehab` binary and the test suite.
//!
//! Everything is written to stderr; stdout carries command results (and
//! `--json` documents) only.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quiet by default: warnings and errors unless RUST_LOG asks for more
pub fn init() {
    init_with_level("warn")
}

/// Install the global subscriber, falling back to `default_level` when
/// RUST_LOG is unset or unparsable
pub fn init_with_level(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

/// Debug-level output routed through the test harness; safe to call from
/// every test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("rehab_core=debug"))
        .try_init();
}
