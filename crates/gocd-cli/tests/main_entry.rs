//! Integration tests for the `gocd` binary entry point.
//!
//! Runs the real binary against bundles whose plugin is a shell script
//! speaking the line protocol.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut command = cargo_bin_cmd!("gocd");
    command.assert().code(2).stderr(contains("Usage"));
}

#[test]
fn version_flag_succeeds() {
    let mut command = cargo_bin_cmd!("gocd");
    command.arg("--version");
    command.assert().success().stdout(contains("gocd"));
}

#[test]
fn unknown_plugin_exits_with_failure() {
    let plugins_dir = tempfile::TempDir::new().expect("create plugins dir");
    let mut command = cargo_bin_cmd!("gocd");
    command
        .args(["config-repo", "check", "-p", "missing.plugin", "build.gocd.yaml"])
        .env("GOCD_PLUGINS_DIR", plugins_dir.path());
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Failed to locate a plugin with id `missing.plugin`"));
}

#[cfg(unix)]
mod shell_plugin {
    use std::path::Path;

    use assert_cmd::cargo::cargo_bin_cmd;
    use gocd_plugins::test_support::{BundleBuilder, protocol_script, shell_plugin_class};
    use predicates::str::contains;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn install(dir: &Path, extension: &str, body: &str) {
        BundleBuilder::new()
            .manifest("yaml.config.plugin")
            .class("com.example.YamlPlugin", &shell_plugin_class("bin/plugin.sh"))
            .entry(
                "bin/plugin.sh",
                protocol_script(extension, &["3.0"], body).as_bytes(),
            )
            .write_to(dir, "yaml.jar")
            .expect("write bundle");
    }

    #[fixture]
    fn plugins_dir() -> TempDir {
        TempDir::new().expect("create plugins dir")
    }

    fn check(dir: &Path) -> assert_cmd::Command {
        let mut command = cargo_bin_cmd!("gocd");
        command
            .args(["config-repo", "check", "-p", "yaml.config.plugin", "build.gocd.yaml"])
            .arg("--plugins-dir")
            .arg(dir)
            .env_remove("GOCD_LOG_FILTER")
            .env_remove("GOCD_LOG_FORMAT");
        command
    }

    #[rstest]
    fn valid_file_prints_ok(plugins_dir: TempDir) {
        install(plugins_dir.path(), "configrepo", r#"{"errors":[]}"#);
        check(plugins_dir.path())
            .assert()
            .success()
            .stdout("OK\n")
            .stderr("");
    }

    #[rstest]
    fn validation_errors_fail_the_check(plugins_dir: TempDir) {
        install(
            plugins_dir.path(),
            "configrepo",
            r#"{"errors":[{"location":"build.gocd.yaml","message":"missing stages"}]}"#,
        );
        check(plugins_dir.path())
            .assert()
            .code(1)
            .stdout("")
            .stderr("[build.gocd.yaml]: missing stages\n");
    }

    #[rstest]
    fn raw_mode_prints_the_envelope(plugins_dir: TempDir) {
        install(plugins_dir.path(), "configrepo", r#"{"errors":[]}"#);
        check(plugins_dir.path())
            .arg("--raw")
            .assert()
            .success()
            .stdout("{\"errors\":[]}\n");
    }

    #[rstest]
    fn plugin_for_another_extension_is_rejected(plugins_dir: TempDir) {
        install(plugins_dir.path(), "scm", r#"{"errors":[]}"#);
        check(plugins_dir.path())
            .assert()
            .code(1)
            .stderr(contains("expected a `configrepo` extension but the plugin implements `scm`"));
    }

    #[rstest]
    fn debug_logging_traces_the_exchange(plugins_dir: TempDir) {
        install(plugins_dir.path(), "configrepo", r#"{"errors":[]}"#);
        check(plugins_dir.path())
            .args(["--log-filter", "gocd_plugins=debug", "--log-format", "json"])
            .assert()
            .success()
            .stdout("OK\n")
            .stderr(contains("read message from plugin stdout"));
    }

    #[rstest]
    fn lists_installed_plugins(plugins_dir: TempDir) {
        install(plugins_dir.path(), "configrepo", r#"{"errors":[]}"#);
        let mut command = cargo_bin_cmd!("gocd");
        command
            .args(["config-repo", "plugins", "-d"])
            .arg(plugins_dir.path());
        command.assert().success().stdout(
            "yaml.config.plugin\tcom.example.YamlPlugin\tyaml.config.plugin 1.0.0\n",
        );
    }
}
