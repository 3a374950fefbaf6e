//! Plugin descriptor (`plugin.xml`) parsing.
//!
//! Every bundle may embed a descriptor at [`MANIFEST_ENTRY`]. Its root element
//! carries the plugin identifier in an `id` attribute and may contain an
//! `<about>` block naming the plugin and its version:
//!
//! ```xml
//! <go-plugin id="yaml.config.plugin" version="1">
//!   <about>
//!     <name>YAML Configuration Plugin</name>
//!     <version>0.13.0</version>
//!   </about>
//! </go-plugin>
//! ```
//!
//! The whole document is read so malformed markup anywhere in it surfaces as
//! [`PluginError::Manifest`] instead of being mistaken for a missing
//! identifier.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::PluginError;

/// Archive entry holding the plugin descriptor.
pub const MANIFEST_ENTRY: &str = "plugin.xml";

/// Optional human-facing metadata from the descriptor's `<about>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct About {
    name: Option<String>,
    version: Option<String>,
}

impl About {
    /// Returns the declared display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the declared plugin version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Parsed view of a bundle's descriptor.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use gocd_plugins::PluginManifest;
///
/// let manifest = PluginManifest::parse(
///     Path::new("yaml.jar"),
///     r#"<go-plugin id="yaml.config.plugin"/>"#,
/// )
/// .expect("well-formed descriptor");
/// assert_eq!(manifest.plugin_id(), Some("yaml.config.plugin"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginManifest {
    plugin_id: Option<String>,
    about: Option<About>,
}

impl PluginManifest {
    /// Parses descriptor markup read from `bundle`.
    ///
    /// A missing or blank `id` attribute yields a manifest without an
    /// identifier; it is never reported as an empty identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Manifest`] when the markup is not well-formed or
    /// has no root element.
    pub fn parse(bundle: &Path, xml: &str) -> Result<Self, PluginError> {
        DescriptorParser::default()
            .parse(xml)
            .map_err(|message| PluginError::Manifest {
                bundle: bundle.to_path_buf(),
                message,
            })
    }

    /// Returns the declared plugin identifier, if one is present and not blank.
    #[must_use]
    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    /// Returns the `<about>` metadata, if the descriptor declares any.
    #[must_use]
    pub const fn about(&self) -> Option<&About> {
        self.about.as_ref()
    }
}

#[derive(Default)]
struct DescriptorParser {
    open: Vec<Vec<u8>>,
    root_seen: bool,
    manifest: PluginManifest,
}

impl DescriptorParser {
    fn parse(mut self, xml: &str) -> Result<PluginManifest, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            let event = reader
                .read_event()
                .map_err(|err| format!("{err} (at byte {})", reader.error_position()))?;
            match event {
                Event::Start(element) => {
                    self.open_element(&element)?;
                    self.open.push(element.name().as_ref().to_vec());
                }
                Event::Empty(element) => self.open_element(&element)?,
                Event::End(element) => {
                    let closing = element.name();
                    match self.open.pop() {
                        Some(name) if name.as_slice() == closing.as_ref() => {}
                        _ => {
                            return Err(format!(
                                "unexpected closing tag </{}>",
                                String::from_utf8_lossy(closing.as_ref())
                            ));
                        }
                    }
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|err| err.to_string())?;
                    self.text(value.trim())?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = self.open.last() {
            return Err(format!(
                "unexpected end of document inside <{}>",
                String::from_utf8_lossy(unclosed)
            ));
        }
        if !self.root_seen {
            return Err(String::from("document has no root element"));
        }
        Ok(self.manifest)
    }

    fn open_element(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        if self.open.is_empty() {
            if self.root_seen {
                return Err(String::from("document has more than one root element"));
            }
            self.root_seen = true;
            self.manifest.plugin_id = read_id(element)?;
        } else if self.open.len() == 1 && element.name().as_ref() == b"about" {
            self.manifest.about.get_or_insert_with(About::default);
        }
        Ok(())
    }

    fn text(&mut self, value: &str) -> Result<(), String> {
        match self.open.as_slice() {
            [] if !value.is_empty() => Err(String::from("text outside the root element")),
            [_, about, field] if about.as_slice() == b"about" => {
                let about = self.manifest.about.get_or_insert_with(About::default);
                match field.as_slice() {
                    b"name" => about.name = Some(value.to_owned()),
                    b"version" => about.version = Some(value.to_owned()),
                    _ => {}
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn read_id(element: &BytesStart<'_>) -> Result<Option<String>, String> {
    let Some(attribute) = element
        .try_get_attribute("id")
        .map_err(|err| err.to_string())?
    else {
        return Ok(None);
    };
    let value = attribute.unescape_value().map_err(|err| err.to_string())?;
    if value.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(value.into_owned()))
}

#[cfg(test)]
mod tests;
