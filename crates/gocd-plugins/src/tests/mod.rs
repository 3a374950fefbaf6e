//! Crate-level integration and BDD tests.

use std::path::Path;

use tempfile::TempDir;

use crate::api::{GoPlugin, GoPluginApiRequest, GoPluginApiResponse, GoPluginIdentifier};
use crate::error::PluginError;
use crate::loader::LoadedClass;
use crate::negotiation::{Instantiator, Negotiator};
use crate::protocol::{CheckOutcome, ParseError, check_file, config_repo_requirement};
use crate::test_support::{BundleBuilder, plugin_class};


/// Instantiates every class as an in-memory plugin with fixed answers.
struct StubInstantiator {
    extension: String,
    version: String,
    body: String,
}

impl StubInstantiator {
    fn new(extension: &str, version: &str, body: &str) -> Self {
        Self {
            extension: extension.to_owned(),
            version: version.to_owned(),
            body: body.to_owned(),
        }
    }
}

struct StubPlugin {
    identifier: GoPluginIdentifier,
    body: String,
}

impl GoPlugin for StubPlugin {
    fn plugin_identifier(&mut self) -> Result<GoPluginIdentifier, PluginError> {
        Ok(self.identifier.clone())
    }

    fn handle(&mut self, _request: &GoPluginApiRequest) -> Result<GoPluginApiResponse, PluginError> {
        Ok(GoPluginApiResponse::success(self.body.clone()))
    }
}

impl Instantiator for StubInstantiator {
    fn instantiate(&self, _class: &LoadedClass) -> Result<Box<dyn GoPlugin>, PluginError> {
        Ok(Box::new(StubPlugin {
            identifier: GoPluginIdentifier::new(self.extension.as_str(), vec![self.version.clone()]),
            body: self.body.clone(),
        }))
    }
}

#[test]
fn end_to_end_check_with_stub() {
    let plugins_dir = TempDir::new().expect("create plugins dir");
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.YamlPlugin", &plugin_class())
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let negotiator = Negotiator::new(StubInstantiator::new(
        "configrepo",
        "3.0",
        r#"{"errors":[{"location":"build.gocd.yaml","message":"missing stages"}]}"#,
    ));
    let mut plugin = negotiator
        .load("yaml.config.plugin", plugins_dir.path(), config_repo_requirement())
        .expect("load plugin");
    let outcome = check_file(&mut plugin, Path::new("build.gocd.yaml")).expect("check file");
    assert_eq!(
        outcome,
        CheckOutcome::Failure(vec![ParseError::new("build.gocd.yaml", "missing stages")])
    );
}

#[cfg(unix)]
#[test]
fn end_to_end_check_with_process_plugin() {
    use crate::process::ProcessInstantiator;
    use crate::test_support::{protocol_script, shell_plugin_class};

    let plugins_dir = TempDir::new().expect("create plugins dir");
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.YamlPlugin", &shell_plugin_class("bin/plugin.sh"))
        .entry(
            "bin/plugin.sh",
            protocol_script("configrepo", &["3.0"], r#"{"errors":[]}"#).as_bytes(),
        )
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let negotiator = Negotiator::new(ProcessInstantiator);
    let mut plugin = negotiator
        .load("yaml.config.plugin", plugins_dir.path(), config_repo_requirement())
        .expect("load plugin");
    assert_eq!(plugin.supported_versions(), ["3.0"]);
    let outcome = check_file(&mut plugin, Path::new("build.gocd.yaml")).expect("check file");
    assert!(outcome.is_success());
}
