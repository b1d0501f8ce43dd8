//! Process-wide tracing setup for embedders and tests.

use log::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Installs a global subscriber and routes `log` records into it.
///
/// `filter` takes an `EnvFilter` directive; without one `RUST_LOG` is used,
/// falling back to `info`. Returns `false` if a global subscriber was
/// already installed, in which case nothing changes.
pub fn init_tracing(filter: Option<&str>, json: bool) -> bool {
    let filter = match filter {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // A logger installed elsewhere keeps receiving `log` records
    let _ = tracing_log::LogTracer::init();
    debug!("Tracing initialized");
    true
}
