//! Command execution and output rendering.

use std::io::Write;
use std::process::ExitCode;

use gocd_config::ensure_dir_exists;
use gocd_plugins::contract::Contract;
use gocd_plugins::negotiation::{Instantiator, Negotiator};
use gocd_plugins::protocol::{CheckOutcome, check_file, config_repo_requirement, parse_file};
use gocd_plugins::registry::{PluginRegistry, RegistryEntry};
use tracing::debug;

use crate::cli::{CheckArgs, CliCommand, ConfigRepoAction, PluginsArgs};
use crate::errors::AppError;

const COMMAND_TARGET: &str = "gocd_cli::commands";

/// Printed on stdout when a file passes validation.
pub(crate) const CHECK_PASSED: &str = "OK";

/// Shown in listings for identifiers whose bundle has no plugin class.
pub(crate) const NO_PLUGIN_CLASS: &str = "<no plugin class>";

/// Output streams a command writes to.
pub(crate) struct Output<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

/// Runs `command`, instantiating plugins with `instantiator`.
pub(crate) fn execute<I, W, E>(
    command: &CliCommand,
    instantiator: I,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    I: Instantiator,
    W: Write,
    E: Write,
{
    match command {
        CliCommand::ConfigRepo { action } => match action {
            ConfigRepoAction::Check(args) => check(args, instantiator, output),
            ConfigRepoAction::Plugins(args) => list_plugins(args, output),
        },
    }
}

fn check<I, W, E>(
    args: &CheckArgs,
    instantiator: I,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    I: Instantiator,
    W: Write,
    E: Write,
{
    let directory = args.plugins.resolve();
    ensure_dir_exists(&directory)?;
    debug!(
        target: COMMAND_TARGET,
        plugin_id = %args.plugin_id,
        directory = %directory.display(),
        file = %args.file.display(),
        "checking file"
    );

    let mut plugin = Negotiator::new(instantiator).load(
        &args.plugin_id,
        &directory,
        config_repo_requirement(),
    )?;

    if args.raw {
        let response = parse_file(&mut plugin, &args.file)?;
        let rendered = serde_json::to_string(&response).map_err(AppError::SerialiseResponse)?;
        writeln!(output.stdout, "{rendered}").map_err(AppError::WriteOutput)?;
        return Ok(exit_code(response.errors().is_empty()));
    }

    match check_file(&mut plugin, &args.file)? {
        CheckOutcome::Success => {
            writeln!(output.stdout, "{CHECK_PASSED}").map_err(AppError::WriteOutput)?;
            Ok(ExitCode::SUCCESS)
        }
        CheckOutcome::Failure(errors) => {
            for error in &errors {
                writeln!(output.stderr, "{error}").map_err(AppError::WriteOutput)?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn list_plugins<W, E>(args: &PluginsArgs, output: &mut Output<'_, W, E>) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    let directory = args.plugins.resolve();
    ensure_dir_exists(&directory)?;

    let registry = PluginRegistry::discover(&directory, Contract::go_plugin())?;
    for (plugin_id, entry) in registry.iter() {
        writeln!(output.stdout, "{}", listing_line(plugin_id, entry))
            .map_err(AppError::WriteOutput)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders `<id>\t<class>` plus `\t<name> <version>` when the bundle says.
pub(crate) fn listing_line(plugin_id: &str, entry: &RegistryEntry) -> String {
    let class = if entry.has_plugin_class() {
        entry.class().name()
    } else {
        NO_PLUGIN_CLASS
    };
    let mut line = format!("{plugin_id}\t{class}");
    if let Some(about) = entry.manifest().about() {
        let described = [about.name(), about.version()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !described.is_empty() {
            line.push('\t');
            line.push_str(&described);
        }
    }
    line
}

const fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
