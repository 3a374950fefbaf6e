//! Helpers for writing plugin bundles in tests.
//!
//! Available to this crate's unit tests and, through the `test-support`
//! feature, to other workspace crates.

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::loader::{
    ClassDescriptor, ConstructorDescriptor, EXTENSION_ANNOTATION, GO_PLUGIN_INTERFACE,
};

/// In-memory description of a bundle to be written as an archive.
///
/// Entries are written in the order they were added, which fixes the
/// archive order seen by class scanning.
#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl BundleBuilder {
    /// Creates a builder with no entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `plugin.xml` descriptor declaring `plugin_id`.
    #[must_use]
    pub fn manifest(self, plugin_id: &str) -> Self {
        self.manifest_xml(&format!(
            r#"<?xml version="1.0" encoding="utf-8"?><go-plugin id="{plugin_id}" version="1"><about><name>{plugin_id}</name><version>1.0.0</version></about></go-plugin>"#
        ))
    }

    /// Adds a `plugin.xml` descriptor with the given raw markup.
    #[must_use]
    pub fn manifest_xml(self, xml: &str) -> Self {
        self.entry(crate::manifest::MANIFEST_ENTRY, xml.as_bytes())
    }

    /// Adds a class entry for `name` with the given descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor cannot be serialised.
    #[must_use]
    #[expect(
        clippy::expect_used,
        reason = "test fixtures panic on malformed setup"
    )]
    pub fn class(self, name: &str, descriptor: &ClassDescriptor) -> Self {
        let json = serde_json::to_vec(descriptor).expect("class descriptor serialises");
        self.entry(&format!("{}.class", name.replace('.', "/")), &json)
    }

    /// Adds a dependency archive under `lib/`.
    ///
    /// # Panics
    ///
    /// Panics if the nested archive cannot be written.
    #[must_use]
    #[expect(
        clippy::expect_used,
        reason = "test fixtures panic on malformed setup"
    )]
    pub fn library(self, file_name: &str, library: &Self) -> Self {
        let bytes = library.to_bytes().expect("dependency archive writes");
        self.entry(&format!("lib/{file_name}"), &bytes)
    }

    /// Adds an arbitrary entry.
    #[must_use]
    pub fn entry(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.to_owned(), content.to_vec()));
        self
    }

    /// Serialises the bundle into archive bytes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the archive cannot be written.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), SimpleFileOptions::default())?;
            writer.write_all(content)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Writes the bundle to `directory/file_name` and returns the path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the archive cannot be written.
    pub fn write_to(&self, directory: &Path, file_name: &str) -> io::Result<PathBuf> {
        let path = directory.join(file_name);
        fs::write(&path, self.to_bytes()?)?;
        Ok(path)
    }
}

/// Descriptor for a class satisfying every eligibility condition.
#[must_use]
pub fn plugin_class() -> ClassDescriptor {
    ClassDescriptor {
        interfaces: vec![GO_PLUGIN_INTERFACE.to_owned()],
        annotations: vec![EXTENSION_ANNOTATION.to_owned()],
        constructors: vec![ConstructorDescriptor::default()],
        ..ClassDescriptor::default()
    }
}

/// Eligible plugin class whose constructor runs `script` with `sh`.
#[must_use]
pub fn shell_plugin_class(script: &str) -> ClassDescriptor {
    ClassDescriptor {
        constructors: vec![ConstructorDescriptor::launching(
            "sh",
            vec![script.to_owned()],
        )],
        ..plugin_class()
    }
}

/// Shell plugin speaking the line protocol: it answers identification with
/// `extension` and `versions`, and every other request with `body`.
#[must_use]
pub fn protocol_script(extension: &str, versions: &[&str], body: &str) -> String {
    let listed = versions
        .iter()
        .map(|version| format!("\"{version}\""))
        .collect::<Vec<_>>()
        .join(",");
    let identifier = format!(r#"{{"extension":"{extension}","supported_versions":[{listed}]}}"#);
    let response = serde_json::json!({ "response_code": 200, "response_body": body }).to_string();
    format!(
        "#!/bin/sh\necho 'plugin starting' >&2\nwhile IFS= read -r line; do\n  case \"$line\" in\n    *'\"kind\":\"identify\"'*) printf '%s\\n' '{identifier}' ;;\n    *) printf '%s\\n' '{response}' ;;\n  esac\ndone\n"
    )
}
