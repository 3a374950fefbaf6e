//! Flag, environment, and default precedence for the global options.

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use clap::Parser;
use rstest::rstest;

use gocd_config::{Config, LOG_FILTER_ENV, LOG_FORMAT_ENV, LogFormat};

/// Serialises access to the process environment across tests.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Parser)]
struct Harness {
    #[command(flatten)]
    config: Config,
}

/// Restores overridden variables when dropped.
struct EnvScope {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut scope = Self {
            saved: Vec::new(),
            _lock: lock,
        };
        scope.remove(LOG_FILTER_ENV);
        scope.remove(LOG_FORMAT_ENV);
        scope
    }

    fn set(&mut self, key: &'static str, value: &str) {
        self.saved.push((key, std::env::var_os(key)));
        // Environment mutation is `unsafe` in edition 2024; the lock keeps
        // other tests in this binary from observing it.
        unsafe { std::env::set_var(key, value) };
    }

    fn remove(&mut self, key: &'static str) {
        self.saved.push((key, std::env::var_os(key)));
        unsafe { std::env::remove_var(key) };
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

fn parse(args: &[&str]) -> Result<Config, clap::Error> {
    Harness::try_parse_from(std::iter::once("gocd").chain(args.iter().copied()))
        .map(|harness| harness.config)
}

#[test]
fn falls_back_to_defaults() {
    let _env = EnvScope::new();
    let config = parse(&[]).expect("parse");
    assert_eq!(config, Config::default());
}

#[rstest]
#[case::filter_only(&["--log-filter", "debug"], Config::new("debug", LogFormat::Compact))]
#[case::format_only(&["--log-format", "json"], Config::new("warn", LogFormat::Json))]
#[case::both(
    &["--log-format", "json", "--log-filter", "gocd_plugins=trace"],
    Config::new("gocd_plugins=trace", LogFormat::Json)
)]
fn reads_flags(#[case] args: &[&str], #[case] expected: Config) {
    let _env = EnvScope::new();
    assert_eq!(parse(args).expect("parse"), expected);
}

#[test]
fn environment_overrides_defaults() {
    let mut env = EnvScope::new();
    env.set(LOG_FILTER_ENV, "info");
    env.set(LOG_FORMAT_ENV, "json");
    assert_eq!(parse(&[]).expect("parse"), Config::new("info", LogFormat::Json));
}

#[test]
fn flags_override_environment() {
    let mut env = EnvScope::new();
    env.set(LOG_FILTER_ENV, "info");
    env.set(LOG_FORMAT_ENV, "json");
    let config = parse(&["--log-filter", "error", "--log-format", "compact"]).expect("parse");
    assert_eq!(config, Config::new("error", LogFormat::Compact));
}

#[test]
fn rejects_unknown_format() {
    let _env = EnvScope::new();
    let err = parse(&["--log-format", "pretty"]).expect_err("unknown format");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}
