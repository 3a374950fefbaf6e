//! Bulk plugin discovery.
//!
//! [`PluginRegistry::discover`] scans every bundle in a plugins directory and
//! maps each declared plugin identifier to the class that currently answers
//! for it. The registry is a diagnostic view: it reports which identifiers
//! are known and what each would resolve to, without instantiating anything.
//!
//! The pass is order-sensitive. Within a bundle the *last* eligible class in
//! archive order wins, and across bundles the *last* bundle declaring an
//! identifier wins. Targeted lookup ([`crate::resolver`]) deliberately uses
//! the opposite, first-match policy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::bundle::{Bundle, find_bundles};
use crate::contract::{Contract, is_plugin_class};
use crate::error::PluginError;
use crate::loader::{LoadedClass, LoadingContext};
use crate::manifest::PluginManifest;

const REGISTRY_TARGET: &str = "gocd_plugins::registry";

/// What a plugin identifier resolves to during bulk discovery.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    manifest: PluginManifest,
    bundle: PathBuf,
    class: Arc<LoadedClass>,
}

impl RegistryEntry {
    /// Returns the descriptor of the bundle that introduced the entry.
    #[must_use]
    pub const fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// Returns the bundle that introduced the entry.
    #[must_use]
    pub fn bundle(&self) -> &Path {
        &self.bundle
    }

    /// Returns the class the identifier resolves to.
    ///
    /// Until an eligible class is found this is the capability interface
    /// itself.
    #[must_use]
    pub const fn class(&self) -> &Arc<LoadedClass> {
        &self.class
    }

    /// Returns `true` once a concrete plugin class replaced the placeholder.
    #[must_use]
    pub fn has_plugin_class(&self) -> bool {
        !self.class.is_interface()
    }
}

/// Identifier to class mapping built across all bundles in a directory.
///
/// Iteration is ordered by identifier.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl PluginRegistry {
    /// Scans `directory` and builds the registry under `contract`.
    ///
    /// All bundles share one loading context for the duration of the pass.
    /// Bundles without a declared identifier contribute nothing.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable directory or bundle, malformed
    /// descriptor, or class that cannot be loaded or inspected. A bad entry
    /// aborts the whole pass rather than being skipped.
    pub fn discover(directory: &Path, contract: Contract<'_>) -> Result<Self, PluginError> {
        let mut context = LoadingContext::new();
        let placeholder = context.load_class(contract.capability())?;
        let mut registry = Self::default();

        for path in find_bundles(directory)? {
            let mut bundle = Bundle::open(&path)?;
            context.add_bundle(&mut bundle)?;

            let Some(manifest) = bundle.manifest()? else {
                debug!(target: REGISTRY_TARGET, bundle = %path.display(), "no descriptor; skipping");
                continue;
            };
            let Some(plugin_id) = manifest.plugin_id().map(str::to_owned) else {
                debug!(target: REGISTRY_TARGET, bundle = %path.display(), "no plugin id; skipping");
                continue;
            };

            let mut class = Arc::clone(&placeholder);
            for name in bundle.class_names() {
                let candidate = context.load_class(&name)?;
                if is_plugin_class(&candidate, contract, &mut context)? {
                    class = candidate;
                }
            }
            debug!(
                target: REGISTRY_TARGET,
                plugin_id = %plugin_id,
                class = class.name(),
                bundle = %path.display(),
                "registered plugin"
            );

            let entry = RegistryEntry {
                manifest,
                bundle: path,
                class,
            };
            if let Some(shadowed) = registry.entries.insert(plugin_id.clone(), entry) {
                debug!(
                    target: REGISTRY_TARGET,
                    plugin_id = %plugin_id,
                    shadowed = %shadowed.bundle.display(),
                    "duplicate plugin id; later bundle wins"
                );
            }
        }
        Ok(registry)
    }

    /// Looks up the entry for `plugin_id`.
    #[must_use]
    pub fn get(&self, plugin_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(plugin_id)
    }

    /// Iterates entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Returns the number of known identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no identifiers were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
