use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const APP_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Directive used when `RUST_LOG` is unset: warnings from this crate only, or full
/// debug output with `verbose`.
fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("{APP_TARGET}={level}")
}

/// Installs the global subscriber on stderr so tables on stdout stay clean.
///
/// `RUST_LOG` replaces the default directive when set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
