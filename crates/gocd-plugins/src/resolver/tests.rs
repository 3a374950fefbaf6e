//! Unit tests for targeted lookup.

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::loader::{ClassDescriptor, ClassOrigin, ConstructorDescriptor};
use crate::test_support::{BundleBuilder, plugin_class};

#[fixture]
fn plugins_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn resolve_in(dir: &TempDir, plugin_id: &str) -> Result<PluginClass, PluginError> {
    resolve(plugin_id, dir.path(), Contract::go_plugin())
}

#[rstest]
fn empty_directory_is_not_found(plugins_dir: TempDir) {
    let err = resolve_in(&plugins_dir, "yaml.config.plugin").expect_err("should fail");
    match err {
        PluginError::NotFound {
            plugin_id,
            directory,
        } => {
            assert_eq!(plugin_id, "yaml.config.plugin");
            assert!(directory.is_absolute());
            assert!(directory.ends_with(
                plugins_dir
                    .path()
                    .file_name()
                    .expect("temp dir has a name")
            ));
        }
        other => panic!("expected NotFound, got {other}"),
    }
}

#[rstest]
fn resolves_the_single_eligible_class(plugins_dir: TempDir) {
    let path = BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.Helper", &ClassDescriptor::default())
        .class("com.example.YamlPlugin", &plugin_class())
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let resolved = resolve_in(&plugins_dir, "yaml.config.plugin").expect("resolve");
    assert_eq!(resolved.plugin_id(), "yaml.config.plugin");
    assert_eq!(resolved.bundle(), path.as_path());
    assert_eq!(resolved.class().name(), "com.example.YamlPlugin");
}

#[rstest]
fn first_eligible_class_in_archive_order_wins(plugins_dir: TempDir) {
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.Second", &plugin_class())
        .class("com.example.First", &plugin_class())
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let resolved = resolve_in(&plugins_dir, "yaml.config.plugin").expect("resolve");
    assert_eq!(resolved.class().name(), "com.example.Second");
}

#[rstest]
fn first_bundle_wins_for_duplicate_identifiers(plugins_dir: TempDir) {
    let earlier = BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.Older", &plugin_class())
        .write_to(plugins_dir.path(), "a-yaml.jar")
        .expect("write bundle");
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.Newer", &plugin_class())
        .write_to(plugins_dir.path(), "b-yaml.jar")
        .expect("write bundle");

    let resolved = resolve_in(&plugins_dir, "yaml.config.plugin").expect("resolve");
    assert_eq!(resolved.class().name(), "com.example.Older");
    assert_eq!(resolved.bundle(), earlier.as_path());
}

#[rstest]
fn other_bundles_do_not_leak_into_the_context(plugins_dir: TempDir) {
    BundleBuilder::new()
        .manifest("support.plugin")
        .class("com.example.Base", &plugin_class())
        .write_to(plugins_dir.path(), "a-support.jar")
        .expect("write bundle");
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class(
            "com.example.YamlPlugin",
            &ClassDescriptor {
                superclass: Some("com.example.Base".to_owned()),
                ..plugin_class()
            },
        )
        .write_to(plugins_dir.path(), "b-yaml.jar")
        .expect("write bundle");

    let err = resolve_in(&plugins_dir, "yaml.config.plugin").expect_err("should fail");
    assert!(matches!(err, PluginError::ClassNotFound { .. }), "got {err}");
}

#[rstest]
fn bundle_without_eligible_class_fails(plugins_dir: TempDir) {
    BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class("com.example.Helper", &ClassDescriptor::default())
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let err = resolve_in(&plugins_dir, "yaml.config.plugin").expect_err("should fail");
    assert!(
        err.to_string()
            .starts_with("failed to identify plugin class for `yaml.config.plugin`"),
        "got {err}"
    );
}

#[rstest]
#[case::empty("")]
#[case::spaces("   ")]
fn blank_identifier_never_matches(plugins_dir: TempDir, #[case] plugin_id: &str) {
    BundleBuilder::new()
        .manifest_xml(r#"<go-plugin id=""/>"#)
        .class("com.example.Plugin", &plugin_class())
        .write_to(plugins_dir.path(), "blank.jar")
        .expect("write bundle");

    let err = resolve_in(&plugins_dir, plugin_id).expect_err("should fail");
    assert!(matches!(err, PluginError::NotFound { .. }), "got {err}");
}

#[rstest]
fn constructor_parameters_resolve_from_dependency_archives(plugins_dir: TempDir) {
    let library = BundleBuilder::new().class(
        "com.example.support.Settings",
        &ClassDescriptor::default(),
    );
    let path = BundleBuilder::new()
        .manifest("yaml.config.plugin")
        .class(
            "com.example.YamlPlugin",
            &ClassDescriptor {
                constructors: vec![
                    ConstructorDescriptor::default(),
                    ConstructorDescriptor {
                        parameters: vec!["com.example.support.Settings".to_owned()],
                        ..ConstructorDescriptor::default()
                    },
                ],
                ..plugin_class()
            },
        )
        .library("support.jar", &library)
        .write_to(plugins_dir.path(), "yaml.jar")
        .expect("write bundle");

    let resolved = resolve_in(&plugins_dir, "yaml.config.plugin").expect("resolve");
    assert_eq!(
        resolved.class().origin(),
        &ClassOrigin::Bundle {
            path,
            library: None
        }
    );
}
