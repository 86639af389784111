//! Logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "session_vault=info";

fn build_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `session_vault=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    tracing_subscriber::registry()
        .with(build_filter(None))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Initialize logging with an explicit filter directive, typically the
/// configured level from [`crate::Config::log_filter`].
///
/// Falls back to the default filter if the directive does not parse.
pub fn init_with(directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(Some(directive)))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(None))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
