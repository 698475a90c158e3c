//! Diagnostic tracing for the loader.
//!
//! Tracing output is for developers and goes to stderr only. User-facing
//! messages (submission errors, missing datasource) travel through
//! [`crate::io::services::Notifier`] instead and are never filtered by
//! `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset and `--verbose` was not passed.
const QUIET_FILTER: &str = "warn";
/// Filter used for `--verbose`: wizard transitions and snapshot writes.
const VERBOSE_FILTER: &str = "warn,sql_loader=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` always wins over `verbose`, so targeted filters such as
/// `RUST_LOG=sql_loader::gate=trace` keep working.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { QUIET_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (tests spawning the binary in-process) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
