//! Config-repo file validation over the plugin API.
//!
//! A `parse-file` request carries a JSON body naming the file to validate:
//!
//! ```json
//! {"file": "pipelines/build.gocd.yaml"}
//! ```
//!
//! The plugin answers with the errors it found, in order:
//!
//! ```json
//! {"errors": [{"location": "build.gocd.yaml", "message": "bad syntax"}]}
//! ```
//!
//! An empty list means the file is valid. A non-empty list is an ordinary
//! [`CheckOutcome::Failure`], not an error; only a body that does not match
//! this shape is reported as [`PluginError::DeserializeResponse`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::GoPluginApiResponse;
use crate::error::PluginError;
use crate::negotiation::{ExtensionRequirement, ResolvedPlugin};

/// Extension type implemented by config-repo plugins.
pub const CONFIG_REPO_EXTENSION: &str = "configrepo";

/// Config-repo extension version this client speaks.
pub const CONFIG_REPO_VERSION: &str = "3.0";

/// Operation name for file validation.
pub const PARSE_FILE_REQUEST: &str = "parse-file";

const PROTOCOL_TARGET: &str = "gocd_plugins::protocol";

/// The extension a plugin must speak to validate config-repo files.
#[must_use]
pub const fn config_repo_requirement() -> ExtensionRequirement<'static> {
    ExtensionRequirement::new(CONFIG_REPO_EXTENSION, CONFIG_REPO_VERSION)
}

/// Body of a `parse-file` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFileRequest {
    file: String,
}

impl ParseFileRequest {
    /// Creates a request for `file`, passing the path through as given.
    #[must_use]
    pub fn new(file: &Path) -> Self {
        Self {
            file: file.to_string_lossy().into_owned(),
        }
    }

    /// Returns the path string sent to the plugin.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }
}

/// One problem a plugin found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    location: String,
    message: String,
}

impl ParseError {
    /// Creates an error record.
    #[must_use]
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Returns where the problem is.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns what the problem is.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.location, self.message)
    }
}

/// Decoded body of a `parse-file` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFileResponse {
    errors: Vec<ParseError>,
}

impl ParseFileResponse {
    /// Creates a response carrying `errors`.
    #[must_use]
    pub const fn new(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }

    /// Returns the reported errors in order.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

/// Result of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The plugin reported no errors.
    Success,
    /// The plugin reported at least one error.
    Failure(Vec<ParseError>),
}

impl CheckOutcome {
    /// Returns `true` for [`CheckOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ParseFileResponse> for CheckOutcome {
    fn from(response: ParseFileResponse) -> Self {
        if response.errors.is_empty() {
            Self::Success
        } else {
            Self::Failure(response.errors)
        }
    }
}

/// Decodes a raw `parse-file` response body.
///
/// # Errors
///
/// Returns [`PluginError::DeserializeResponse`], carrying `body`, when it is
/// not a JSON object with an `errors` list of location/message records.
///
/// # Example
///
/// ```
/// use gocd_plugins::protocol::decode_response;
///
/// let response = decode_response(r#"{"errors":[{"location":"L1","message":"bad syntax"}]}"#)
///     .expect("well-formed body");
/// assert_eq!(response.errors()[0].to_string(), "[L1]: bad syntax");
/// assert!(decode_response("not json").is_err());
/// ```
pub fn decode_response(body: &str) -> Result<ParseFileResponse, PluginError> {
    serde_json::from_str(body).map_err(|source| PluginError::DeserializeResponse {
        raw: body.to_owned(),
        source,
    })
}

/// Asks `plugin` to validate `file` and returns the decoded response.
///
/// # Errors
///
/// Returns transport errors from the exchange and
/// [`PluginError::DeserializeResponse`] for a malformed body.
pub fn parse_file(
    plugin: &mut ResolvedPlugin,
    file: &Path,
) -> Result<ParseFileResponse, PluginError> {
    let body = serde_json::to_string(&ParseFileRequest::new(file))
        .map_err(PluginError::SerializeRequest)?;
    let response = plugin.handle(PARSE_FILE_REQUEST, body)?;
    if response.response_code() != GoPluginApiResponse::SUCCESS {
        warn!(
            target: PROTOCOL_TARGET,
            plugin_id = plugin.plugin_id(),
            response_code = response.response_code(),
            "plugin answered with a non-success code"
        );
    }
    decode_response(response.response_body())
}

/// Asks `plugin` to validate `file`.
///
/// # Errors
///
/// See [`parse_file`]. Validation errors are returned as
/// [`CheckOutcome::Failure`], not as an error.
pub fn check_file(plugin: &mut ResolvedPlugin, file: &Path) -> Result<CheckOutcome, PluginError> {
    parse_file(plugin, file).map(CheckOutcome::from)
}
