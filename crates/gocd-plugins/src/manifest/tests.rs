//! Unit tests for descriptor parsing.

use std::path::Path;

use rstest::rstest;

use super::*;

fn parse(xml: &str) -> Result<PluginManifest, PluginError> {
    PluginManifest::parse(Path::new("/plugins/example.jar"), xml)
}

#[test]
fn reads_identifier_from_root_element() {
    let manifest = parse(r#"<?xml version="1.0"?><go-plugin id="json.config.plugin" version="1"></go-plugin>"#)
        .expect("parse descriptor");
    assert_eq!(manifest.plugin_id(), Some("json.config.plugin"));
    assert!(manifest.about().is_none());
}

#[test]
fn reads_about_block() {
    let xml = r#"
        <go-plugin id="yaml.config.plugin" version="1">
          <about>
            <name>YAML Configuration Plugin</name>
            <version>0.13.0</version>
            <vendor><name>Tomasz Setkowski</name></vendor>
          </about>
        </go-plugin>
    "#;
    let manifest = parse(xml).expect("parse descriptor");
    let about = manifest.about().expect("about block");
    assert_eq!(about.name(), Some("YAML Configuration Plugin"));
    assert_eq!(about.version(), Some("0.13.0"));
}

#[rstest]
#[case::missing(r#"<go-plugin version="1"/>"#)]
#[case::empty(r#"<go-plugin id=""/>"#)]
#[case::blank(r#"<go-plugin id="   "/>"#)]
fn absent_or_blank_identifier_is_none(#[case] xml: &str) {
    let manifest = parse(xml).expect("parse descriptor");
    assert_eq!(manifest.plugin_id(), None);
}

#[test]
fn unescapes_identifier() {
    let manifest = parse(r#"<go-plugin id="a&amp;b"/>"#).expect("parse descriptor");
    assert_eq!(manifest.plugin_id(), Some("a&b"));
}

#[rstest]
#[case::mismatched_tags(r#"<go-plugin id="x"><about></go-plugin>"#)]
#[case::unclosed_root(r#"<go-plugin id="x"><about/>"#)]
#[case::no_root("")]
#[case::two_roots(r#"<go-plugin id="x"/><go-plugin id="y"/>"#)]
#[case::stray_text(r#"garbage <go-plugin id="x"/>"#)]
fn malformed_markup_is_an_error(#[case] xml: &str) {
    let error = parse(xml).expect_err("malformed descriptor must fail");
    match error {
        PluginError::Manifest { bundle, .. } => {
            assert_eq!(bundle, Path::new("/plugins/example.jar"));
        }
        other => panic!("expected manifest error, got {other}"),
    }
}
