//! Plugin bundle discovery and archive access.
//!
//! Bundles are ZIP archives matching [`BUNDLE_GLOB`] that sit directly inside
//! the plugins directory. Each bundle holds class entries, an optional
//! descriptor (see [`crate::manifest`]), and two reserved prefixes:
//! `META-INF/` for archive metadata and `lib/` for bundled dependency
//! archives. Neither reserved prefix is scanned for plugin classes.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use zip::ZipArchive;
use zip::result::{ZipError, ZipResult};

use crate::error::PluginError;
use crate::manifest::{MANIFEST_ENTRY, PluginManifest};

/// Filename pattern identifying plugin bundles.
pub const BUNDLE_GLOB: &str = "*.jar";

const METADATA_PREFIX: &str = "META-INF/";
const LIBRARY_PREFIX: &str = "lib/";
const CLASS_SUFFIX: &str = ".class";
const LIBRARY_SUFFIX: &str = ".jar";

/// Tracing target for bundle operations.
const BUNDLE_TARGET: &str = "gocd_plugins::bundle";

/// Lists the bundles directly inside `directory`, sorted by file name.
///
/// Subdirectories are not descended into and only regular files whose name
/// matches [`BUNDLE_GLOB`] are returned. An empty result is not an error.
///
/// # Errors
///
/// Returns [`PluginError::Io`] if the directory cannot be listed.
pub fn find_bundles(directory: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let pattern = Pattern::new(BUNDLE_GLOB).map_err(|err| {
        PluginError::io(directory, io::Error::new(io::ErrorKind::InvalidInput, err))
    })?;

    let mut bundles = Vec::new();
    for entry in fs::read_dir(directory).map_err(|err| PluginError::io(directory, err))? {
        let path = entry.map_err(|err| PluginError::io(directory, err))?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name));
        if matches && path.is_file() {
            bundles.push(path);
        }
    }
    bundles.sort();

    debug!(
        target: BUNDLE_TARGET,
        directory = %directory.display(),
        count = bundles.len(),
        "listed plugin bundles"
    );
    Ok(bundles)
}

/// An open plugin bundle.
#[derive(Debug)]
pub struct Bundle {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl Bundle {
    /// Opens the bundle at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] if the file cannot be opened, or
    /// [`PluginError::Archive`] if it is not a readable archive.
    pub fn open(path: &Path) -> Result<Self, PluginError> {
        let file = File::open(path).map_err(|err| PluginError::io(path, err))?;
        let archive = ZipArchive::new(file).map_err(|err| PluginError::archive(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Returns the bundle's path on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the bundle's descriptor.
    ///
    /// Returns `Ok(None)` when the bundle has no descriptor entry.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Manifest`] for malformed markup or text that
    /// is not UTF-8, and
    /// [`PluginError::Archive`] if the entry cannot be read.
    pub fn manifest(&mut self) -> Result<Option<PluginManifest>, PluginError> {
        let bytes = match self.archive.by_name(MANIFEST_ENTRY) {
            Ok(mut entry) => {
                read_bytes(&mut entry).map_err(|err| PluginError::io(&self.path, err))?
            }
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(PluginError::archive(&self.path, err)),
        };
        let xml = std::str::from_utf8(&bytes).map_err(|err| PluginError::Manifest {
            bundle: self.path.clone(),
            message: format!("descriptor is not valid UTF-8: {err}"),
        })?;
        PluginManifest::parse(&self.path, xml).map(Some)
    }

    /// Reads the declared plugin identifier, treating a missing descriptor
    /// or blank identifier as no identifier.
    ///
    /// # Errors
    ///
    /// See [`Bundle::manifest`].
    pub fn plugin_id(&mut self) -> Result<Option<String>, PluginError> {
        Ok(self
            .manifest()?
            .and_then(|manifest| manifest.plugin_id().map(str::to_owned)))
    }

    /// Returns the names of candidate classes in archive order.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|index| self.archive.name_for_index(index))
            .filter(|name| is_class_entry(name))
            .map(to_class_name)
            .collect()
    }

    /// Reads every candidate class entry, keyed by class name.
    pub(crate) fn class_descriptors(&mut self) -> Result<HashMap<String, Vec<u8>>, PluginError> {
        collect_class_descriptors(&mut self.archive)
            .map_err(|err| PluginError::archive(&self.path, err))
    }

    /// Reads every dependency archive stored under `lib/`.
    pub(crate) fn libraries(&mut self) -> Result<Vec<(String, Vec<u8>)>, PluginError> {
        let mut libraries = Vec::new();
        for index in 0..self.archive.len() {
            let mut entry = self
                .archive
                .by_index(index)
                .map_err(|err| PluginError::archive(&self.path, err))?;
            if entry.is_dir() || !is_library_entry(entry.name()) {
                continue;
            }
            let name = entry.name().to_owned();
            let bytes = read_bytes(&mut entry).map_err(|err| PluginError::io(&self.path, err))?;
            libraries.push((name, bytes));
        }
        Ok(libraries)
    }

    /// Unpacks the whole bundle into `directory`.
    pub(crate) fn extract_to(&mut self, directory: &Path) -> Result<(), PluginError> {
        self.archive
            .extract(directory)
            .map_err(|err| PluginError::archive(&self.path, err))
    }
}

/// Reads the class entries of any archive, first definition winning.
pub(crate) fn collect_class_descriptors<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> ZipResult<HashMap<String, Vec<u8>>> {
    let mut descriptors = HashMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !is_class_entry(entry.name()) {
            continue;
        }
        let name = to_class_name(entry.name());
        let bytes = read_bytes(&mut entry)?;
        descriptors.entry(name).or_insert(bytes);
    }
    Ok(descriptors)
}

fn read_bytes(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Returns `true` for class entries outside the reserved prefixes.
pub(crate) fn is_class_entry(name: &str) -> bool {
    name.ends_with(CLASS_SUFFIX)
        && !(name.starts_with(METADATA_PREFIX) || name.starts_with(LIBRARY_PREFIX))
}

fn is_library_entry(name: &str) -> bool {
    name.starts_with(LIBRARY_PREFIX) && name.ends_with(LIBRARY_SUFFIX)
}

/// Converts an entry path such as `com/example/Plugin.class` to a class name.
pub(crate) fn to_class_name(entry: &str) -> String {
    let relative = entry.strip_prefix('/').unwrap_or(entry);
    relative
        .strip_suffix(CLASS_SUFFIX)
        .unwrap_or(relative)
        .replace('/', ".")
}
