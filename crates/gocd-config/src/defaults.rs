use std::path::PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Directory, relative to the home directory, holding installed plugins.
pub const PLUGINS_SUBDIRECTORY: &str = ".gocd/plugins";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value for serde defaults.
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Computes the default plugins directory, `<home>/.gocd/plugins`.
///
/// Falls back to a path relative to the working directory when no home
/// directory can be determined.
#[must_use]
pub fn default_plugins_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(PLUGINS_SUBDIRECTORY),
        |home| home.join(PLUGINS_SUBDIRECTORY),
    )
}
