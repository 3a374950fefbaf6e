//! Shared configuration for the `gocd` tooling.
//!
//! [`Config`] carries the global logging options. It is parsed by `clap` as a
//! flattened argument group, so every option is available as a flag and,
//! when the flag is absent, from its environment variable. Values that are
//! neither given on the command line nor in the environment fall back to the
//! [`defaults`](crate::default_log_filter).
//!
//! | Option           | Flag             | Environment        | Default            |
//! |------------------|------------------|--------------------|--------------------|
//! | log filter       | `--log-filter`   | `GOCD_LOG_FILTER`  | `warn`             |
//! | log format       | `--log-format`   | `GOCD_LOG_FORMAT`  | `compact`          |
//! | plugins directory| `--plugins-dir`  | `GOCD_PLUGINS_DIR` | `~/.gocd/plugins`  |
//!
//! The plugins directory is a per-command option; this crate supplies its
//! default and the [`ensure_dir_exists`] bootstrap.

mod defaults;
mod directory;
mod logging;

use clap::Args;
use serde::{Deserialize, Serialize};

use defaults::default_log_filter_string;
pub use defaults::{
    DEFAULT_LOG_FILTER, PLUGINS_SUBDIRECTORY, default_log_filter, default_log_format,
    default_plugins_dir,
};
pub use directory::{ConfigError, ensure_dir_exists};
pub use logging::LogFormat;

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "GOCD_LOG_FILTER";

/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV: &str = "GOCD_LOG_FORMAT";

/// Environment variable overriding the plugins directory.
pub const PLUGINS_DIR_ENV: &str = "GOCD_PLUGINS_DIR";

/// Global options shared by every `gocd` command.
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct Config {
    /// Tracing filter expression, for example `gocd_plugins=debug`.
    #[arg(
        long = "log-filter",
        value_name = "EXPR",
        env = LOG_FILTER_ENV,
        default_value = DEFAULT_LOG_FILTER,
        global = true
    )]
    #[serde(default = "default_log_filter_string")]
    log_filter: String,

    /// Log output format: `json` or `compact`.
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        env = LOG_FORMAT_ENV,
        default_value_t = default_log_format(),
        global = true
    )]
    #[serde(default = "default_log_format")]
    log_format: LogFormat,
}

impl Config {
    /// Creates a configuration with explicit values.
    #[must_use]
    pub fn new(log_filter: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            log_filter: log_filter.into(),
            log_format,
        }
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_log_filter(), default_log_format())
    }
}
