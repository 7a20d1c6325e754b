//! Opening deck packages from ZIP containers

use crate::content_types::ContentTypes;
use crate::error::{StoreError, StoreResult};
use crate::paths::resolve_target;
use crate::presentation::extract_id_lists;
use crate::rels_io::{parse_rels, rels_path_for};
use deck_model::{Package, PackageKind, Part, PartId, PartKind, RelTarget, XmlElement};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Open a serialized deck package into an in-memory [`Package`]
pub fn open_package(bytes: &[u8]) -> StoreResult<Package> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut files: HashMap<String, Vec<u8>> = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        files.insert(file.name().to_string(), data);
    }

    let ct_bytes = files
        .get("[Content_Types].xml")
        .ok_or_else(|| StoreError::MissingPart("[Content_Types].xml".into()))?;
    let content_types = ContentTypes::parse(&String::from_utf8(ct_bytes.clone())?)?;

    let mut pkg = Package::new(PackageKind::Presentation);
    let mut ids_by_path: HashMap<String, PartId> = HashMap::new();

    // Deterministic arena order regardless of archive layout
    let mut part_paths: Vec<&String> = files
        .keys()
        .filter(|p| p.as_str() != "[Content_Types].xml" && !is_rels_path(p))
        .collect();
    part_paths.sort();

    for path in part_paths {
        let content_type = content_types.get(path);
        let (kind, ct_override) = classify(content_type, path);
        let data = &files[path.as_str()];

        let part = if kind.is_binary() {
            Part::binary(
                kind,
                path.clone(),
                ct_override
                    .or_else(|| content_type.map(|s| s.to_string()))
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data.clone(),
            )
        } else {
            let text = String::from_utf8(data.clone())?;
            let tree = XmlElement::parse(&text)?;
            let mut part = Part::xml(kind, path.clone(), tree);
            part.content_type = ct_override;
            part
        };

        let id = pkg.add_part(part);
        ids_by_path.insert(path.clone(), id);
    }

    // Wire up relationships now that every part has an id
    for (path, &owner) in &ids_by_path {
        let Some(rels_bytes) = files.get(&rels_path_for(path)) else {
            continue;
        };
        let raw = parse_rels(&String::from_utf8(rels_bytes.clone())?)?;
        for rel in raw {
            let target = if rel.external {
                RelTarget::External(rel.target)
            } else {
                let target_path = resolve_target(path, &rel.target);
                match ids_by_path.get(&target_path) {
                    Some(&id) => RelTarget::Internal(id),
                    None => {
                        // Already-dangling input; the merge core never
                        // introduces new danglers but does not repair these.
                        tracing::warn!(
                            "dropping dangling relationship {} on {} -> {}",
                            rel.id,
                            path,
                            target_path
                        );
                        continue;
                    }
                }
            };
            pkg.rels_mut(owner)?
                .insert_with_id(&rel.id, &rel.rel_type, target);
        }
    }

    // Root part from the package-level rels
    let root_rels_bytes = files
        .get("_rels/.rels")
        .ok_or_else(|| StoreError::MissingPart("_rels/.rels".into()))?;
    let root_raw = parse_rels(&String::from_utf8(root_rels_bytes.clone())?)?;
    let root_target = root_raw
        .iter()
        .find(|r| r.rel_type == deck_model::relationship_types::PRESENTATION)
        .ok_or_else(|| StoreError::InvalidPackage("no officeDocument relationship".into()))?;
    let root_path = resolve_target("", &root_target.target);
    let root = *ids_by_path
        .get(&root_path)
        .ok_or_else(|| StoreError::MissingPart(root_path.clone()))?;
    pkg.set_root(root);

    extract_id_lists(&mut pkg)?;
    Ok(pkg)
}

fn is_rels_path(path: &str) -> bool {
    path.ends_with(".rels") && (path.starts_with("_rels/") || path.contains("/_rels/"))
}

/// Classify a part by its declared content type, falling back to its path.
/// Returns the kind plus a per-part content type override when the kind
/// has no fixed one.
fn classify(content_type: Option<&str>, path: &str) -> (PartKind, Option<String>) {
    if let Some(ct) = content_type {
        if let Some(kind) = PartKind::from_content_type(ct) {
            return (kind, None);
        }
        if ct.starts_with("image/") || ct.starts_with("audio/") || ct.starts_with("video/") {
            return (PartKind::Media, Some(ct.to_string()));
        }
        if ct == "application/vnd.openxmlformats-officedocument.oleObject" {
            return (PartKind::EmbeddedObject, Some(ct.to_string()));
        }
        if path.starts_with("ppt/embeddings/") {
            return (PartKind::EmbeddedPackage, Some(ct.to_string()));
        }
        if ct.ends_with("+xml") || ct == "application/xml" {
            return (PartKind::CustomXml, Some(ct.to_string()));
        }
        return (PartKind::Media, Some(ct.to_string()));
    }
    if path.ends_with(".xml") {
        (PartKind::CustomXml, None)
    } else {
        (PartKind::Media, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_kind() {
        let (kind, ct) = classify(
            Some("application/vnd.openxmlformats-officedocument.presentationml.slide+xml"),
            "ppt/slides/slide1.xml",
        );
        assert_eq!(kind, PartKind::Slide);
        assert!(ct.is_none());
    }

    #[test]
    fn test_classify_media() {
        let (kind, ct) = classify(Some("image/png"), "ppt/media/image1.png");
        assert_eq!(kind, PartKind::Media);
        assert_eq!(ct.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_classify_embedded_package() {
        let (kind, _) = classify(
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            "ppt/embeddings/package1.xlsx",
        );
        assert_eq!(kind, PartKind::EmbeddedPackage);
    }

    #[test]
    fn test_is_rels_path() {
        assert!(is_rels_path("_rels/.rels"));
        assert!(is_rels_path("ppt/slides/_rels/slide1.xml.rels"));
        assert!(!is_rels_path("ppt/slides/slide1.xml"));
    }
}
