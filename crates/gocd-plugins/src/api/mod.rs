//! The host-facing contract of a live plugin instance.
//!
//! A plugin identifies itself with the extension type it implements and the
//! versions of that extension it speaks, then answers requests addressed to
//! that extension. Request and response bodies are opaque JSON text at this
//! layer; [`crate::protocol`] gives them meaning.

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Extension type and versions a plugin instance declares.
///
/// # Example
///
/// ```
/// use gocd_plugins::api::GoPluginIdentifier;
///
/// let identifier = GoPluginIdentifier::new("configrepo", vec!["2.0".into(), "3.0".into()]);
/// assert!(identifier.supports("configrepo", "3.0"));
/// assert!(!identifier.supports("configrepo", "1.0"));
/// assert!(!identifier.supports("notification", "3.0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoPluginIdentifier {
    extension: String,
    supported_versions: Vec<String>,
}

impl GoPluginIdentifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(extension: impl Into<String>, supported_versions: Vec<String>) -> Self {
        Self {
            extension: extension.into(),
            supported_versions,
        }
    }

    /// Returns the declared extension type.
    #[must_use]
    pub const fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Returns the declared extension versions.
    #[must_use]
    pub fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }

    /// Returns `true` when the declaration covers `extension` at `version`.
    #[must_use]
    pub fn supports(&self, extension: &str, version: &str) -> bool {
        self.extension == extension && self.supported_versions.iter().any(|v| v == version)
    }
}

/// Request addressed to a plugin's message-handling entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoPluginApiRequest {
    extension: String,
    extension_version: String,
    request_name: String,
    request_body: String,
}

impl GoPluginApiRequest {
    /// Creates a request envelope.
    #[must_use]
    pub fn new(
        extension: impl Into<String>,
        extension_version: impl Into<String>,
        request_name: impl Into<String>,
        request_body: impl Into<String>,
    ) -> Self {
        Self {
            extension: extension.into(),
            extension_version: extension_version.into(),
            request_name: request_name.into(),
            request_body: request_body.into(),
        }
    }

    /// Returns the extension type.
    #[must_use]
    pub const fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Returns the extension version.
    #[must_use]
    pub const fn extension_version(&self) -> &str {
        self.extension_version.as_str()
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn request_name(&self) -> &str {
        self.request_name.as_str()
    }

    /// Returns the serialised request body.
    #[must_use]
    pub const fn request_body(&self) -> &str {
        self.request_body.as_str()
    }
}

/// Response returned by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoPluginApiResponse {
    response_code: u16,
    #[serde(default)]
    response_body: String,
}

impl GoPluginApiResponse {
    /// Status code signalling a handled request.
    pub const SUCCESS: u16 = 200;

    /// Creates a response.
    #[must_use]
    pub fn new(response_code: u16, response_body: impl Into<String>) -> Self {
        Self {
            response_code,
            response_body: response_body.into(),
        }
    }

    /// Creates a `200` response.
    #[must_use]
    pub fn success(response_body: impl Into<String>) -> Self {
        Self::new(Self::SUCCESS, response_body)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn response_code(&self) -> u16 {
        self.response_code
    }

    /// Returns the raw response body.
    #[must_use]
    pub const fn response_body(&self) -> &str {
        self.response_body.as_str()
    }
}

/// A live plugin instance.
///
/// Instances are created by an
/// [`Instantiator`](crate::negotiation::Instantiator) and used by a single
/// thread for the lifetime of one invocation.
pub trait GoPlugin {
    /// Queries the extension type and versions the instance speaks.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Transport`] if the instance cannot answer.
    fn plugin_identifier(&mut self) -> Result<GoPluginIdentifier, PluginError>;

    /// Delivers `request` and returns the instance's response.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Transport`] or
    /// [`PluginError::SerializeRequest`] if the exchange fails.
    fn handle(&mut self, request: &GoPluginApiRequest) -> Result<GoPluginApiResponse, PluginError>;
}
