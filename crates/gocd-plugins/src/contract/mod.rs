//! Plugin-class eligibility.
//!
//! A class is *the* plugin class of a bundle only if all of the following
//! hold:
//!
//! 1. it is assignable to the contract's capability interface;
//! 2. it carries the contract's extension marker;
//! 3. it is a public, non-abstract class (not an interface or annotation);
//! 4. it is not a non-static inner type;
//! 5. it has a public zero-parameter constructor.
//!
//! Checking the constructors resolves the parameter types of every public
//! constructor. A parameter type the bundle does not ship is a hard
//! [`PluginError::ClassNotFound`] rather than a quiet "not eligible", so a
//! broken bundle is reported instead of silently skipped.

use crate::error::PluginError;
use crate::loader::{EXTENSION_ANNOTATION, GO_PLUGIN_INTERFACE, LoadedClass, LoadingContext};

/// Capability interface and marker a plugin class must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contract<'a> {
    capability: &'a str,
    marker: &'a str,
}

impl<'a> Contract<'a> {
    /// Creates a contract for the given capability interface and marker.
    #[must_use]
    pub const fn new(capability: &'a str, marker: &'a str) -> Self {
        Self { capability, marker }
    }

    /// Returns the capability interface name.
    #[must_use]
    pub const fn capability(&self) -> &'a str {
        self.capability
    }

    /// Returns the marker name.
    #[must_use]
    pub const fn marker(&self) -> &'a str {
        self.marker
    }
}

impl Contract<'static> {
    /// The host's plugin contract.
    ///
    /// ```
    /// use gocd_plugins::Contract;
    ///
    /// let contract = Contract::go_plugin();
    /// assert_eq!(contract.capability(), "com.thoughtworks.go.plugin.api.GoPlugin");
    /// ```
    #[must_use]
    pub const fn go_plugin() -> Self {
        Self::new(GO_PLUGIN_INTERFACE, EXTENSION_ANNOTATION)
    }
}

/// Decides whether `class` is an eligible plugin class under `contract`.
///
/// # Errors
///
/// Returns [`PluginError::ClassNotFound`] or [`PluginError::InvalidClass`]
/// if a public constructor's parameter type cannot be loaded through
/// `context`.
pub fn is_plugin_class(
    class: &LoadedClass,
    contract: Contract<'_>,
    context: &mut LoadingContext,
) -> Result<bool, PluginError> {
    if !meets_contract(class, contract) {
        return Ok(false);
    }
    is_instantiable(class, context)
}

fn meets_contract(class: &LoadedClass, contract: Contract<'_>) -> bool {
    class.is_assignable_to(contract.capability())
        && class.has_annotation(contract.marker())
        && !class.is_interface()
        && class.is_public()
        && !class.is_abstract()
}

fn is_instantiable(class: &LoadedClass, context: &mut LoadingContext) -> Result<bool, PluginError> {
    if class.is_non_static_inner() {
        return Ok(false);
    }
    for constructor in class.public_constructors() {
        for parameter in &constructor.parameters {
            context.load_dependency(parameter, class.name())?;
        }
    }
    Ok(class.default_constructor().is_some())
}

#[cfg(test)]
mod tests;
