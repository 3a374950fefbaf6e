//! Process-backed plugin instances.
//!
//! [`ProcessInstantiator`] implements [`Instantiator`] by running the
//! entrypoint declared on a class's zero-parameter constructor. The owning
//! bundle is unpacked into a private temporary directory which becomes the
//! child's working directory, so the entrypoint can reach anything the
//! bundle ships.
//!
//! The child speaks a line-oriented JSON protocol over stdio. Each exchange
//! is one [`PluginCall`] line on stdin answered by one line on stdout.
//! Anything the child writes to stderr is forwarded to debug logs.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tracing::debug;

use crate::api::{GoPlugin, GoPluginApiRequest, GoPluginApiResponse, GoPluginIdentifier};
use crate::bundle::Bundle;
use crate::error::PluginError;
use crate::loader::{ClassOrigin, LoadedClass};
use crate::negotiation::Instantiator;

/// Tracing target for plugin process operations.
const PLUGIN_TARGET: &str = "gocd_plugins::process";

const WORKDIR_PREFIX: &str = "gocd-plugin-";

/// One message from the host to a plugin process.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PluginCall<'a> {
    /// Asks the plugin for its [`GoPluginIdentifier`].
    Identify,
    /// Delivers a request; answered with a [`GoPluginApiResponse`].
    Request(&'a GoPluginApiRequest),
}

/// Instantiates plugin classes by starting their entrypoint process.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use gocd_plugins::negotiation::{ExtensionRequirement, Negotiator};
/// use gocd_plugins::process::ProcessInstantiator;
///
/// let negotiator = Negotiator::new(ProcessInstantiator);
/// let plugin = negotiator.load(
///     "yaml.config.plugin",
///     Path::new("/home/go/.gocd/plugins"),
///     ExtensionRequirement::new("configrepo", "3.0"),
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInstantiator;

impl Instantiator for ProcessInstantiator {
    fn instantiate(&self, class: &LoadedClass) -> Result<Box<dyn GoPlugin>, PluginError> {
        Ok(Box::new(ProcessPlugin::spawn(class)?))
    }
}

/// A plugin instance running as a child process.
///
/// The child leads its own process group. Dropping the instance closes its
/// stdin, kills the whole group, reaps the child, and removes its working
/// directory. Nothing waits on the stderr forwarder, which ends on its own
/// once every holder of the pipe is gone.
#[derive(Debug)]
pub struct ProcessPlugin {
    class: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    workdir: TempDir,
}

impl ProcessPlugin {
    /// Unpacks the bundle defining `class` and starts its entrypoint.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Instantiation`] for host types, classes
    /// without a launchable zero-parameter constructor, and spawn failures;
    /// bundle read errors are passed through.
    pub fn spawn(class: &LoadedClass) -> Result<Self, PluginError> {
        let name = class.name();
        let ClassOrigin::Bundle { path: bundle, .. } = class.origin() else {
            return Err(instantiation(name, "host types cannot be instantiated", None));
        };
        let launch = class
            .default_constructor()
            .and_then(|constructor| constructor.launch.as_ref())
            .ok_or_else(|| instantiation(name, "constructor declares no entrypoint", None))?;

        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(|err| instantiation(name, "failed to create working directory", Some(err)))?;
        Bundle::open(bundle)?.extract_to(workdir.path())?;
        let program = resolve_program(workdir.path(), &launch.program)
            .map_err(|err| instantiation(name, "failed to prepare entrypoint", Some(err)))?;

        debug!(
            target: PLUGIN_TARGET,
            class = name,
            program = %program.display(),
            workdir = %workdir.path().display(),
            "spawning plugin process"
        );

        let mut command = Command::new(&program);
        command
            .args(&launch.args)
            .current_dir(workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|err| {
                instantiation(
                    name,
                    &format!("failed to start '{}'", program.display()),
                    Some(err),
                )
            })?;

        let stdin = child.stdin.take();
        if let Some(stderr) = child.stderr.take() {
            pump_stderr(name.to_owned(), stderr);
        }
        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child);
            drop(child.wait());
            return Err(instantiation(name, "failed to capture stdout", None));
        };

        Ok(Self {
            class: name.to_owned(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            workdir,
        })
    }

    /// Returns the name of the class this process was started for.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the directory the bundle was unpacked into.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        self.workdir.path()
    }

    fn exchange<T: DeserializeOwned>(&mut self, call: &PluginCall<'_>) -> Result<T, PluginError> {
        let line = serde_json::to_string(call).map_err(PluginError::SerializeRequest)?;
        self.write_line(&line)?;
        let reply = self.read_line()?;
        serde_json::from_str(reply.trim()).map_err(|err| {
            self.transport(&format!("plugin produced an invalid message: {err}"), None)
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), PluginError> {
        debug!(
            target: PLUGIN_TARGET,
            class = %self.class,
            request_bytes = line.len(),
            "writing message to plugin stdin"
        );
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(self.transport("plugin stdin is closed", None));
        };
        let written = stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush());
        written.map_err(|err| self.transport("failed to write to plugin stdin", Some(err)))
    }

    fn read_line(&mut self) -> Result<String, PluginError> {
        let mut line = String::new();
        let bytes_read = self
            .stdout
            .read_line(&mut line)
            .map_err(|err| self.transport("failed to read plugin stdout", Some(err)))?;
        debug!(
            target: PLUGIN_TARGET,
            class = %self.class,
            bytes_read,
            "read message from plugin stdout"
        );
        if bytes_read == 0 {
            return Err(self.transport("plugin closed its output", None));
        }
        Ok(line)
    }

    fn transport(&self, message: &str, source: Option<std::io::Error>) -> PluginError {
        PluginError::Transport {
            class: self.class.clone(),
            message: message.to_owned(),
            source: source.map(Arc::new),
        }
    }
}

impl GoPlugin for ProcessPlugin {
    fn plugin_identifier(&mut self) -> Result<GoPluginIdentifier, PluginError> {
        self.exchange(&PluginCall::Identify)
    }

    fn handle(&mut self, request: &GoPluginApiRequest) -> Result<GoPluginApiResponse, PluginError> {
        self.exchange(&PluginCall::Request(request))
    }
}

impl Drop for ProcessPlugin {
    fn drop(&mut self) {
        drop(self.stdin.take());
        terminate(&mut self.child);
        match self.child.wait() {
            Ok(status) => debug!(target: PLUGIN_TARGET, class = %self.class, ?status, "plugin process exited"),
            Err(err) => debug!(target: PLUGIN_TARGET, class = %self.class, %err, "failed to reap plugin process"),
        }
    }
}

/// Kills the child's process group, falling back to the child alone.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let killed = i32::try_from(child.id())
        .ok()
        .is_some_and(|leader| killpg(Pid::from_raw(leader), Signal::SIGKILL).is_ok());
    if !killed {
        drop(child.kill());
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    drop(child.kill());
}

/// Resolves `program` inside `workdir` when the bundle ships it, falling
/// back to a `PATH` lookup otherwise.
fn resolve_program(workdir: &Path, program: &str) -> std::io::Result<PathBuf> {
    let shipped = workdir.join(program);
    if Path::new(program).is_relative() && shipped.is_file() {
        make_executable(&shipped)?;
        return Ok(shipped);
    }
    Ok(PathBuf::from(program))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Forwards the child's stderr to debug logs on a detached thread until the
/// pipe closes.
fn pump_stderr(class: String, stderr: ChildStderr) {
    std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            debug!(target: PLUGIN_TARGET, class = %class, stderr = %line, "plugin stderr output");
        }
    });
}

fn instantiation(class: &str, message: &str, source: Option<std::io::Error>) -> PluginError {
    PluginError::Instantiation {
        class: class.to_owned(),
        message: message.to_owned(),
        source: source.map(Arc::new),
    }
}
