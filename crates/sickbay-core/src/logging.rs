//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::default_log_filter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`default_log_filter`]. Later calls are no-ops, as is calling it after the
/// host installed its own subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialized");
    }
}
