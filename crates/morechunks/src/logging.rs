//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber printing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `default_directives` is used
/// (for example `"info"` or `"info,morechunks_connection=debug"`). Does
/// nothing if a global subscriber is already installed, so hosts that set
/// up their own logging can still call it.
pub fn init_logging(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
