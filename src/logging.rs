//! Logging setup.
//!
//! `RUST_LOG` always wins. Without it the configured filter is used, and
//! `--verbose` raises the fallback level to `debug`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

/// Pick the filter directive used when `RUST_LOG` is not set
pub fn fallback_filter(configured: Option<&str>, verbose: bool) -> &str {
    if verbose {
        VERBOSE_FILTER
    } else {
        configured.unwrap_or(DEFAULT_FILTER)
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_logging(configured: Option<&str>, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_filter(configured, verbose)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
