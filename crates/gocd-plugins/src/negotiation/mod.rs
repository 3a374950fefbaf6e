//! Instantiation and extension negotiation.
//!
//! The [`Negotiator`] turns a resolved plugin class into a live instance
//! through an [`Instantiator`], with the console silenced while the instance
//! is constructed. It then checks that the instance speaks the required
//! extension at the required version before handing it out as a
//! [`ResolvedPlugin`].
//!
//! The instantiator abstraction lets tests substitute in-memory plugins for
//! the production [`ProcessInstantiator`](crate::process::ProcessInstantiator).

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::api::{GoPlugin, GoPluginApiRequest, GoPluginApiResponse};
use crate::console::silence_console;
use crate::contract::Contract;
use crate::error::PluginError;
use crate::loader::LoadedClass;
use crate::resolver::resolve;

const NEGOTIATION_TARGET: &str = "gocd_plugins::negotiation";

/// Creates live plugin instances from loaded classes.
pub trait Instantiator {
    /// Invokes the public zero-parameter constructor of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Instantiation`] if construction fails.
    fn instantiate(&self, class: &LoadedClass) -> Result<Box<dyn GoPlugin>, PluginError>;
}

/// Extension type and version a caller needs a plugin to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionRequirement<'a> {
    extension: &'a str,
    version: &'a str,
}

impl<'a> ExtensionRequirement<'a> {
    /// Creates a requirement.
    #[must_use]
    pub const fn new(extension: &'a str, version: &'a str) -> Self {
        Self { extension, version }
    }

    /// Returns the required extension type.
    #[must_use]
    pub const fn extension(&self) -> &'a str {
        self.extension
    }

    /// Returns the required extension version.
    #[must_use]
    pub const fn version(&self) -> &'a str {
        self.version
    }
}

/// A live plugin instance that passed negotiation.
///
/// Requests sent through [`ResolvedPlugin::handle`] carry the negotiated
/// extension type and version.
pub struct ResolvedPlugin {
    plugin_id: String,
    extension: String,
    extension_version: String,
    supported_versions: Vec<String>,
    instance: Box<dyn GoPlugin>,
}

impl ResolvedPlugin {
    /// Returns the plugin identifier.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Returns the negotiated extension type.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the negotiated extension version.
    #[must_use]
    pub fn extension_version(&self) -> &str {
        &self.extension_version
    }

    /// Returns every version the instance declared.
    #[must_use]
    pub fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }

    /// Sends `request_name` with `request_body` to the instance.
    ///
    /// # Errors
    ///
    /// Propagates transport failures from the instance.
    pub fn handle(
        &mut self,
        request_name: &str,
        request_body: impl Into<String>,
    ) -> Result<GoPluginApiResponse, PluginError> {
        let request = GoPluginApiRequest::new(
            self.extension.as_str(),
            self.extension_version.as_str(),
            request_name,
            request_body,
        );
        self.instance.handle(&request)
    }
}

impl fmt::Debug for ResolvedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPlugin")
            .field("plugin_id", &self.plugin_id)
            .field("extension", &self.extension)
            .field("extension_version", &self.extension_version)
            .field("supported_versions", &self.supported_versions)
            .finish_non_exhaustive()
    }
}

/// Instantiates plugin classes and checks their declared extension.
#[derive(Debug, Clone, Default)]
pub struct Negotiator<I> {
    instantiator: I,
}

impl<I> Negotiator<I> {
    /// Creates a negotiator using `instantiator`.
    #[must_use]
    pub const fn new(instantiator: I) -> Self {
        Self { instantiator }
    }
}

impl<I: Instantiator> Negotiator<I> {
    /// Instantiates `class` and verifies it speaks `requirement`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Console`] or [`PluginError::Instantiation`] if
    /// the instance cannot be created, transport errors if it cannot
    /// identify itself, and [`PluginError::InvalidPlugin`] when the declared
    /// extension type differs or the required version is not supported.
    pub fn negotiate(
        &self,
        plugin_id: &str,
        class: &LoadedClass,
        requirement: ExtensionRequirement<'_>,
    ) -> Result<ResolvedPlugin, PluginError> {
        let mut instance = silence_console(|| self.instantiator.instantiate(class))??;
        let identifier = instance.plugin_identifier()?;
        debug!(
            target: NEGOTIATION_TARGET,
            plugin_id,
            extension = identifier.extension(),
            versions = ?identifier.supported_versions(),
            "plugin identified"
        );

        if identifier.extension() != requirement.extension() {
            return Err(PluginError::InvalidPlugin {
                plugin_id: plugin_id.to_owned(),
                message: format!(
                    "expected a `{}` extension but the plugin implements `{}`",
                    requirement.extension(),
                    identifier.extension()
                ),
            });
        }
        if !identifier.supports(requirement.extension(), requirement.version()) {
            return Err(PluginError::InvalidPlugin {
                plugin_id: plugin_id.to_owned(),
                message: format!(
                    "`{}` version {} is not among the supported versions [{}]",
                    requirement.extension(),
                    requirement.version(),
                    identifier.supported_versions().join(", ")
                ),
            });
        }

        Ok(ResolvedPlugin {
            plugin_id: plugin_id.to_owned(),
            extension: requirement.extension().to_owned(),
            extension_version: requirement.version().to_owned(),
            supported_versions: identifier.supported_versions().to_vec(),
            instance,
        })
    }

    /// Resolves `plugin_id` in `directory` and negotiates with its class.
    ///
    /// # Errors
    ///
    /// Returns any resolution error from [`resolve`] or negotiation error
    /// from [`Negotiator::negotiate`].
    pub fn load(
        &self,
        plugin_id: &str,
        directory: &Path,
        requirement: ExtensionRequirement<'_>,
    ) -> Result<ResolvedPlugin, PluginError> {
        let plugin = resolve(plugin_id, directory, Contract::go_plugin())?;
        self.negotiate(plugin.plugin_id(), plugin.class(), requirement)
    }
}
