//! Diagnostic logging for the `gocd` binary.
//!
//! Events are written to stderr. Stdout carries only command output such as
//! plugin listings and check verdicts.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use gocd_config::{Config, LogFormat};

static INSTALLED: OnceCell<()> = OnceCell::new();

type StderrLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Failures raised while setting up diagnostic logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `--log-filter` or `GOCD_LOG_FILTER` is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Some other global subscriber won the race to install.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Routes `tracing` events to stderr using the filter and format in `config`.
///
/// The filter is checked on each call so a bad `--log-filter` is always
/// reported. Only the first call installs a subscriber.
///
/// # Errors
///
/// [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already set.
///
/// # Examples
///
/// ```rust
/// use gocd_config::Config;
/// use gocd_cli::telemetry;
///
/// # fn main() -> Result<(), gocd_cli::telemetry::TelemetryError> {
/// telemetry::initialise(&Config::default())?;
/// telemetry::initialise(&Config::default())?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    INSTALLED.get_or_try_init(|| {
        let subscriber = Registry::default().with(stderr_layer(config.log_format()).with_filter(filter));
        tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
    })?;
    Ok(())
}

fn stderr_layer(format: LogFormat) -> StderrLayer {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());
    match format {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}
