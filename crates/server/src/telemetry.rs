#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to stderr; stdout carries protocol frames only.
///
/// `RUST_LOG` overrides `default_filter` when set. Calling this twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
