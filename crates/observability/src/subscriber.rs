//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable single-line output, captured by the test harness.
    Compact,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directives` when set. Returns `false` when a
/// subscriber was already installed (the call is then a no-op).
pub fn init_with(format: LogFormat, default_directives: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let installed = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init()
            .is_ok(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_test_writer()
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(?format, "tracing subscriber installed");
    }
    installed
}
