//! [Content_Types].xml parsing and generation

use crate::error::{StoreError, StoreResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

pub const RELS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.relationships+xml";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Content types declared by a deck package
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Default content types by extension (e.g. "png" -> "image/png")
    pub defaults: HashMap<String, String>,
    /// Override content types by part name (e.g. "/ppt/presentation.xml" -> "...")
    pub overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Create content types with the standard package defaults
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.defaults
            .insert("rels".to_string(), RELS_CONTENT_TYPE.to_string());
        ct.defaults
            .insert("xml".to_string(), XML_CONTENT_TYPE.to_string());
        ct
    }

    /// Parse [Content_Types].xml
    pub fn parse(content: &str) -> StoreResult<Self> {
        let mut result = Self::default();
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if name.as_ref() == b"Default" {
                        if let (Some(ext), Some(ct)) =
                            (get_attribute(e, b"Extension"), get_attribute(e, b"ContentType"))
                        {
                            result.defaults.insert(ext, ct);
                        }
                    } else if name.as_ref() == b"Override" {
                        if let (Some(part), Some(ct)) =
                            (get_attribute(e, b"PartName"), get_attribute(e, b"ContentType"))
                        {
                            result.overrides.insert(part, ct);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(StoreError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Content type for a package path, overrides first, then by extension
    pub fn get(&self, path: &str) -> Option<&str> {
        let normalized = normalize_part_name(path);
        if let Some(ct) = self.overrides.get(&normalized) {
            return Some(ct);
        }
        path.rsplit('.')
            .next()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()))
            .map(|s| s.as_str())
    }

    /// Add an override for a specific part
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides
            .insert(normalize_part_name(part_name), content_type.to_string());
    }

    /// Add a default for an extension unless one is already declared.
    /// Returns false if a conflicting default exists.
    pub fn add_default(&mut self, extension: &str, content_type: &str) -> bool {
        match self.defaults.get(extension) {
            Some(existing) => existing == content_type,
            None => {
                self.defaults
                    .insert(extension.to_string(), content_type.to_string());
                true
            }
        }
    }

    /// Generate [Content_Types].xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        let mut defaults: Vec<_> = self.defaults.iter().collect();
        defaults.sort();
        for (ext, ct) in defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                ext, ct
            ));
        }

        let mut overrides: Vec<_> = self.overrides.iter().collect();
        overrides.sort();
        for (part, ct) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                part, ct
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

fn normalize_part_name(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub(crate) fn get_attribute(event: &quick_xml::events::BytesStart, name: &[u8]) -> Option<String> {
    event
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}
