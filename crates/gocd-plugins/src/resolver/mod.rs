//! Targeted lookup of a single plugin.
//!
//! Unlike bulk discovery, resolution stops at the *first* bundle (in sorted
//! file-name order) declaring the requested identifier, and returns the
//! *first* eligible class in that bundle's archive order. The bundle is
//! loaded into a fresh [`LoadingContext`] of its own, so classes from other
//! bundles in the directory can never satisfy or shadow its references.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::bundle::{Bundle, find_bundles};
use crate::contract::{Contract, is_plugin_class};
use crate::error::PluginError;
use crate::loader::{LoadedClass, LoadingContext};

const RESOLVER_TARGET: &str = "gocd_plugins::resolver";

/// The plugin class selected for one identifier.
#[derive(Debug, Clone)]
pub struct PluginClass {
    plugin_id: String,
    bundle: PathBuf,
    class: Arc<LoadedClass>,
}

impl PluginClass {
    /// Returns the identifier that was resolved.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Returns the bundle holding the class.
    #[must_use]
    pub fn bundle(&self) -> &Path {
        &self.bundle
    }

    /// Returns the selected class.
    #[must_use]
    pub const fn class(&self) -> &Arc<LoadedClass> {
        &self.class
    }
}

/// Opens the first bundle in `directory` whose descriptor declares
/// `plugin_id`.
///
/// A blank `plugin_id` never matches.
///
/// # Errors
///
/// Returns [`PluginError::NotFound`] naming the identifier and the absolute
/// directory when no bundle matches, or any error raised while listing or
/// reading bundles before the match.
pub fn find_bundle(plugin_id: &str, directory: &Path) -> Result<Bundle, PluginError> {
    if !plugin_id.trim().is_empty() {
        for path in find_bundles(directory)? {
            let mut bundle = Bundle::open(&path)?;
            if bundle.plugin_id()?.as_deref() == Some(plugin_id) {
                debug!(
                    target: RESOLVER_TARGET,
                    plugin_id,
                    bundle = %path.display(),
                    "matched plugin bundle"
                );
                return Ok(bundle);
            }
        }
    }
    Err(PluginError::NotFound {
        plugin_id: plugin_id.to_owned(),
        directory: std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf()),
    })
}

/// Resolves `plugin_id` to its plugin class under `contract`.
///
/// # Errors
///
/// Returns [`PluginError::NotFound`] as [`find_bundle`] does,
/// [`PluginError::NoEligibleClass`] if the matching bundle holds no class
/// satisfying `contract`, and loading errors for classes that cannot be
/// resolved.
pub fn resolve(
    plugin_id: &str,
    directory: &Path,
    contract: Contract<'_>,
) -> Result<PluginClass, PluginError> {
    let mut bundle = find_bundle(plugin_id, directory)?;
    let mut context = LoadingContext::new();
    context.add_bundle(&mut bundle)?;

    for name in bundle.class_names() {
        let candidate = context.load_class(&name)?;
        if is_plugin_class(&candidate, contract, &mut context)? {
            debug!(
                target: RESOLVER_TARGET,
                plugin_id,
                class = candidate.name(),
                "resolved plugin class"
            );
            return Ok(PluginClass {
                plugin_id: plugin_id.to_owned(),
                bundle: bundle.path().to_path_buf(),
                class: candidate,
            });
        }
    }
    Err(PluginError::NoEligibleClass {
        plugin_id: plugin_id.to_owned(),
        bundle: bundle.path().to_path_buf(),
    })
}

#[cfg(test)]
mod tests;
