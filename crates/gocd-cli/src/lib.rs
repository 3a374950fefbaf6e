//! Command-line interface runtime for the `gocd` tool.
//!
//! The runtime owns argument parsing, telemetry bootstrap, and command
//! dispatch. Output streams are injected so the same code path serves the
//! binary entrypoint and tests.
//!
//! Exit codes: `0` when a file passes validation or a listing completes,
//! `1` when a plugin reports validation errors or any fault occurs, and
//! clap's own code (normally `2`) for usage errors.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use gocd_plugins::negotiation::Instantiator;
use gocd_plugins::process::ProcessInstantiator;
use tracing::warn;

mod cli;
mod commands;
mod errors;
pub mod telemetry;

use cli::Cli;
use commands::{Output, execute};
use errors::AppError;

const CLI_TARGET: &str = "gocd_cli";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<A, T, W, E>(args: A, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    A: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    run_with_instantiator(args, ProcessInstantiator, stdout, stderr)
}

pub(crate) fn run_with_instantiator<A, T, I, W, E>(
    args: A,
    instantiator: I,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    A: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    I: Instantiator,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let mut output = Output { stdout, stderr };
    let result = telemetry::initialise(&cli.config)
        .map_err(AppError::from)
        .and_then(|()| execute(&cli.command, instantiator, &mut output));

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => report(output.stderr, &error),
    }
}

/// Writes clap's rendering of `error` where clap would and mirrors its exit
/// code, so `--help` and `--version` succeed on stdout.
fn report_usage<W: Write, E: Write>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode {
    let rendered = error.render();
    let written = if error.use_stderr() {
        write!(stderr, "{rendered}")
    } else {
        write!(stdout, "{rendered}")
    };
    if let Err(write_error) = written {
        warn!(target: CLI_TARGET, error = %write_error, "failed to write usage message");
    }
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn report<E: Write>(stderr: &mut E, error: &AppError) -> ExitCode {
    if let Err(write_error) = writeln!(stderr, "{error}") {
        warn!(target: CLI_TARGET, error = %write_error, "failed to write diagnostic");
    }
    ExitCode::FAILURE
}
