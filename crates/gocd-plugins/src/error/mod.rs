//! Domain errors raised while discovering, loading, and invoking plugins.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can tell a misconfigured bundle apart from a misbehaving plugin. Foreign
//! error sources are wrapped in `Arc` to satisfy the `result_large_err` Clippy
//! lint and keep the enum `Send + Sync`.
//!
//! A plugin reporting validation errors for a file is *not* represented here:
//! that outcome is a normal value, see
//! [`CheckOutcome`](crate::protocol::CheckOutcome).

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from plugin discovery, loading, negotiation, and invocation.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A filesystem operation failed.
    #[error("I/O error accessing '{}': {source}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A bundle could not be opened or read as an archive.
    #[error("failed to read plugin bundle '{}': {source}", .path.display())]
    Archive {
        /// Path of the offending bundle.
        path: PathBuf,
        /// Underlying archive error.
        #[source]
        source: Arc<zip::result::ZipError>,
    },

    /// No bundle in the plugins directory declares the requested identifier.
    #[error("Failed to locate a plugin with id `{plugin_id}` in [{}]", .directory.display())]
    NotFound {
        /// Identifier that was searched for.
        plugin_id: String,
        /// Directory that was searched.
        directory: PathBuf,
    },

    /// A bundle's descriptor document is malformed.
    #[error("invalid plugin descriptor in '{}': {message}", .bundle.display())]
    Manifest {
        /// Bundle containing the descriptor.
        bundle: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// A class name matched no registered source and no host type.
    #[error("class '{name}' not found{}", required_by_suffix(.required_by.as_deref()))]
    ClassNotFound {
        /// Name that failed to resolve.
        name: String,
        /// Class whose linkage needed the missing type, if any.
        required_by: Option<String>,
    },

    /// A class entry exists but cannot be defined.
    #[error("invalid class '{name}': {message}")]
    InvalidClass {
        /// Name of the class.
        name: String,
        /// Description of the defect.
        message: String,
    },

    /// A bundle matched the identifier but contains no eligible plugin class.
    #[error("failed to identify plugin class for `{plugin_id}` in '{}'", .bundle.display())]
    NoEligibleClass {
        /// Identifier declared by the bundle.
        plugin_id: String,
        /// Bundle that was scanned.
        bundle: PathBuf,
    },

    /// The plugin class could not be instantiated.
    #[error("failed to instantiate plugin class '{class}': {message}")]
    Instantiation {
        /// Name of the class.
        class: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The plugin does not speak the required extension type or version.
    #[error("plugin `{plugin_id}` is not usable: {message}")]
    InvalidPlugin {
        /// Identifier of the plugin.
        plugin_id: String,
        /// Description of the mismatch.
        message: String,
    },

    /// Communication with a live plugin instance failed.
    #[error("error communicating with plugin class '{class}': {message}")]
    Transport {
        /// Name of the plugin class.
        class: String,
        /// Description of the failure.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// A request envelope could not be serialised to JSON.
    #[error("failed to serialise plugin request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The plugin's response body does not match the response envelope.
    #[error("Error occurred while parsing plugin response: {source}\nPlugin responded with: {raw}")]
    DeserializeResponse {
        /// Raw response body, kept for diagnosis.
        raw: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The process console could not be redirected or restored.
    #[error("failed to {action} the process console: {source}")]
    Console {
        /// Operation that failed.
        action: &'static str,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

fn required_by_suffix(required_by: Option<&str>) -> String {
    required_by.map_or_else(String::new, |class| format!(" (required by '{class}')"))
}

impl PluginError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
