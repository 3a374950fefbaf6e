//! Plugins directory bootstrap.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while preparing configured directories.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The plugins directory could not be created or is not a directory.
    #[error("failed to prepare plugins directory '{}': {source}", .path.display())]
    PluginsDirectory {
        /// Directory that was being prepared.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Creates `path` and any missing parents, then checks it is a directory.
///
/// # Errors
///
/// Returns [`ConfigError::PluginsDirectory`] when the tree cannot be created
/// or `path` names something other than a directory.
pub fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    let failure = |source: io::Error| ConfigError::PluginsDirectory {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };
    fs::create_dir_all(path).map_err(failure)?;
    if fs::metadata(path).map_err(failure)?.is_dir() {
        Ok(())
    } else {
        Err(failure(io::Error::new(
            io::ErrorKind::NotADirectory,
            "path exists but is not a directory",
        )))
    }
}
