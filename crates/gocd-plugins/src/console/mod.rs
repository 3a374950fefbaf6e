//! Scoped silencing of the process console.
//!
//! Plugin construction may write to standard output or error, which would
//! corrupt the host's own output. [`silence_console`] points file descriptors
//! 1 and 2 at the null device for the duration of a closure and restores the
//! originals when its guard drops, whether the closure returns, fails, or
//! panics.
//!
//! The descriptors are process-wide, so a mutex serialises guards across
//! threads. On non-Unix targets silencing is a no-op.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::PluginError;

static CONSOLE_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with standard output and error redirected to the null device.
///
/// # Errors
///
/// Returns [`PluginError::Console`] if the streams cannot be redirected.
/// Failures while restoring them are logged, since they happen on drop.
///
/// # Example
///
/// ```
/// let answer = gocd_plugins::console::silence_console(|| {
///     println!("swallowed");
///     42
/// })
/// .expect("console redirected");
/// assert_eq!(answer, 42);
/// ```
pub fn silence_console<T>(f: impl FnOnce() -> T) -> Result<T, PluginError> {
    let guard = ConsoleGuard::acquire()?;
    let result = f();
    drop(guard);
    Ok(result)
}

/// Holds the console redirected until dropped.
struct ConsoleGuard {
    #[cfg(unix)]
    saved: unix::SavedStreams,
    _lock: MutexGuard<'static, ()>,
}

impl ConsoleGuard {
    fn acquire() -> Result<Self, PluginError> {
        let lock = CONSOLE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        flush_streams();
        Ok(Self {
            #[cfg(unix)]
            saved: unix::SavedStreams::redirect_to_null()?,
            _lock: lock,
        })
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        flush_streams();
        #[cfg(unix)]
        if let Err(err) = self.saved.restore() {
            tracing::warn!(target: "gocd_plugins::console", %err, "failed to restore console");
        }
    }
}

fn flush_streams() {
    drop(io::stdout().flush());
    drop(io::stderr().flush());
}

#[cfg(unix)]
mod unix {
    use std::fs::OpenOptions;
    use std::io;
    use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
    use std::sync::Arc;

    use nix::unistd::dup2;

    use crate::error::PluginError;

    const STDOUT_FD: RawFd = 1;
    const STDERR_FD: RawFd = 2;
    const NULL_DEVICE: &str = "/dev/null";

    /// Duplicates of the original descriptors 1 and 2.
    pub(super) struct SavedStreams {
        stdout: OwnedFd,
        stderr: OwnedFd,
    }

    impl SavedStreams {
        pub(super) fn redirect_to_null() -> Result<Self, PluginError> {
            let saved = Self {
                stdout: duplicate(io::stdout().as_fd(), "save")?,
                stderr: duplicate(io::stderr().as_fd(), "save")?,
            };
            let null = OpenOptions::new()
                .write(true)
                .open(NULL_DEVICE)
                .map_err(|err| console_error("open the null device for", err))?;
            if let Err(err) = point(null.as_raw_fd(), STDOUT_FD)
                .and_then(|()| point(null.as_raw_fd(), STDERR_FD))
            {
                drop(saved.restore());
                return Err(console_error("redirect", err));
            }
            Ok(saved)
        }

        pub(super) fn restore(&self) -> Result<(), PluginError> {
            point(self.stdout.as_raw_fd(), STDOUT_FD)
                .and_then(|()| point(self.stderr.as_raw_fd(), STDERR_FD))
                .map_err(|err| console_error("restore", err))
        }
    }

    fn duplicate(fd: BorrowedFd<'_>, action: &'static str) -> Result<OwnedFd, PluginError> {
        fd.try_clone_to_owned()
            .map_err(|err| console_error(action, err))
    }

    fn point(source: RawFd, target: RawFd) -> io::Result<()> {
        dup2(source, target).map(drop).map_err(io::Error::from)
    }

    fn console_error(action: &'static str, source: io::Error) -> PluginError {
        PluginError::Console {
            action,
            source: Arc::new(source),
        }
    }
}
