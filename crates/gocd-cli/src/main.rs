//! CLI entrypoint for the `gocd` tool.
//!
//! The binary delegates to [`gocd_cli::run`], which parses arguments,
//! installs telemetry, and dispatches the selected command.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: plugin stderr is logged from a helper thread that
    // must be able to take the stderr lock while a command runs.
    gocd_cli::run(std::env::args_os(), &mut io::stdout(), &mut io::stderr())
}
