//! Diagnostics go to stderr through `tracing`; stdout carries command output
//! only, so `--format json` stays machine-readable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DAYBOOK_LOG";

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("daybook={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
