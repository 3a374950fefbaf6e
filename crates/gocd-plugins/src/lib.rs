//! Discovery and invocation of GoCD plugin bundles.
//!
//! The `gocd-plugins` crate finds plugin bundles in a plugins directory,
//! loads their classes in isolation from one another, selects the class that
//! implements the plugin contract, and talks to a live instance of it to
//! validate config-repo files.
//!
//! # Architecture
//!
//! Bundles are ZIP archives ([`bundle`]) carrying a `plugin.xml` descriptor
//! ([`manifest`]) and JSON class descriptors. A [`LoadingContext`] resolves
//! class names against the bundles registered with it, and the
//! [`contract`] module decides which class is *the* plugin class.
//!
//! Two passes build on these pieces and deliberately disagree on ordering:
//!
//! - [`PluginRegistry::discover`] scans every bundle and keeps the *last*
//!   match per bundle and per identifier, for listing;
//! - [`resolver::resolve`] stops at the *first* matching bundle and the
//!   *first* eligible class, for invocation.
//!
//! A resolved class is turned into a live [`GoPlugin`] by an
//! [`Instantiator`], checked for extension compatibility by the
//! [`Negotiator`], and finally asked to validate a file through the
//! [`protocol`] client.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use gocd_plugins::negotiation::Negotiator;
//! use gocd_plugins::process::ProcessInstantiator;
//! use gocd_plugins::protocol::{CheckOutcome, check_file, config_repo_requirement};
//!
//! let negotiator = Negotiator::new(ProcessInstantiator);
//! let mut plugin = negotiator
//!     .load(
//!         "yaml.config.plugin",
//!         Path::new("/home/go/.gocd/plugins"),
//!         config_repo_requirement(),
//!     )
//!     .expect("plugin loads");
//! match check_file(&mut plugin, Path::new("build.gocd.yaml")).expect("plugin answers") {
//!     CheckOutcome::Success => {}
//!     CheckOutcome::Failure(errors) => assert!(!errors.is_empty()),
//! }
//! ```

pub mod api;
pub mod bundle;
pub mod console;
pub mod contract;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod negotiation;
pub mod process;
pub mod protocol;
pub mod registry;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests;

pub use self::api::{GoPlugin, GoPluginApiRequest, GoPluginApiResponse, GoPluginIdentifier};
pub use self::contract::Contract;
pub use self::error::PluginError;
pub use self::loader::{LoadedClass, LoadingContext};
pub use self::manifest::{About, PluginManifest};
pub use self::negotiation::{ExtensionRequirement, Instantiator, Negotiator, ResolvedPlugin};
pub use self::protocol::{CheckOutcome, ParseError};
pub use self::registry::{PluginRegistry, RegistryEntry};
pub use self::resolver::PluginClass;
