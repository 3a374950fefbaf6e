//! CLI argument definitions for the `gocd` tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gocd_config::{Config, PLUGINS_DIR_ENV, default_plugins_dir};

/// Command-line interface for the `gocd` tool.
#[derive(Parser, Debug)]
#[command(
    name = "gocd",
    version,
    about = "Validates GoCD config-repo files with the plugins that own them",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: Config,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level command groups.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Works with config-repo plugins.
    #[command(name = "config-repo")]
    ConfigRepo {
        /// The config-repo action to perform.
        #[command(subcommand)]
        action: ConfigRepoAction,
    },
}

/// Config-repo actions.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ConfigRepoAction {
    /// Validates a file with the config-repo plugin that owns its format.
    Check(CheckArgs),
    /// Lists the plugins found in the plugins directory.
    Plugins(PluginsArgs),
}

/// Location of the installed plugin bundles.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct PluginsDir {
    /// Directory holding plugin bundles [default: ~/.gocd/plugins].
    #[arg(short = 'd', long = "plugins-dir", value_name = "DIR", env = PLUGINS_DIR_ENV)]
    plugins_dir: Option<PathBuf>,
}

impl PluginsDir {
    #[cfg(test)]
    pub(crate) fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: Some(plugins_dir.into()),
        }
    }

    /// Returns the configured directory or the per-user default.
    pub(crate) fn resolve(&self) -> PathBuf {
        self.plugins_dir.clone().unwrap_or_else(default_plugins_dir)
    }
}

/// Arguments of `config-repo check`.
#[derive(Args, Debug, Clone)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) plugins: PluginsDir,
    /// Identifier of the plugin to validate with.
    #[arg(short = 'p', long = "plugin-id", value_name = "ID")]
    pub(crate) plugin_id: String,
    /// Prints the plugin's response as JSON instead of a summary.
    #[arg(long)]
    pub(crate) raw: bool,
    /// File to validate.
    #[arg(value_name = "FILE")]
    pub(crate) file: PathBuf,
}

/// Arguments of `config-repo plugins`.
#[derive(Args, Debug, Clone)]
pub(crate) struct PluginsArgs {
    #[command(flatten)]
    pub(crate) plugins: PluginsDir,
}
