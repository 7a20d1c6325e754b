//! `.rels` file parsing and generation
//!
//! The raw entries carry target strings; the reader resolves internal
//! targets to part ids once the whole arena is known.

use crate::content_types::get_attribute;
use crate::error::{StoreError, StoreResult};
use crate::paths::relative_target;
use deck_model::{Package, PartId, RelTarget};
use quick_xml::events::Event;
use quick_xml::Reader;

/// One entry read from a `.rels` file, target not yet resolved
#[derive(Debug, Clone)]
pub struct RawRel {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Parse a `.rels` file into raw entries
pub fn parse_rels(content: &str) -> StoreResult<Vec<RawRel>> {
    let mut result = Vec::new();
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"Relationship" {
                    let id = get_attribute(e, b"Id").ok_or_else(|| {
                        StoreError::InvalidPackage("Relationship missing Id".into())
                    })?;
                    let rel_type = get_attribute(e, b"Type").ok_or_else(|| {
                        StoreError::InvalidPackage("Relationship missing Type".into())
                    })?;
                    let target = get_attribute(e, b"Target").ok_or_else(|| {
                        StoreError::InvalidPackage("Relationship missing Target".into())
                    })?;
                    let external = get_attribute(e, b"TargetMode")
                        .map(|m| m == "External")
                        .unwrap_or(false);
                    result.push(RawRel {
                        id,
                        rel_type,
                        target,
                        external,
                    });
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

/// Generate the `.rels` XML for one owner part
pub fn rels_to_xml(pkg: &Package, owner: PartId, owner_path: &str) -> StoreResult<String> {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);

    let mut rels: Vec<_> = pkg.rels(owner)?.all().collect();
    rels.sort_by(|a, b| a.id.cmp(&b.id));
    for rel in rels {
        match &rel.target {
            RelTarget::Internal(target) => {
                let target_path = &pkg.part(*target)?.path;
                xml.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                    rel.id,
                    rel.rel_type,
                    relative_target(owner_path, target_path)
                ));
            }
            RelTarget::External(uri) => {
                xml.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}" TargetMode="External"/>"#,
                    rel.id,
                    rel.rel_type,
                    escape_attr(uri)
                ));
            }
        }
    }

    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Package path of the `.rels` file belonging to a part path
pub fn rels_path_for(part_path: &str) -> String {
    match part_path.rfind('/') {
        Some(i) => format!("{}/_rels/{}.rels", &part_path[..i], &part_path[i + 1..]),
        None => format!("_rels/{}.rels", part_path),
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('"', "&quot;")
}
