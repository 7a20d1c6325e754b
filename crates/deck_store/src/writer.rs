//! Saving deck packages to ZIP containers

use crate::content_types::{ContentTypes, RELS_CONTENT_TYPE, XML_CONTENT_TYPE};
use crate::error::{StoreError, StoreResult};
use crate::presentation::sync_id_lists;
use crate::rels_io::{rels_path_for, rels_to_xml};
use deck_model::{relationship_types, Package};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Serialize a package to container bytes.
///
/// Takes `&mut` because the root part's id-list elements are regenerated
/// from the package's ordered lists before writing.
pub fn save_package(pkg: &mut Package) -> StoreResult<Vec<u8>> {
    sync_id_lists(pkg)?;

    let root = pkg
        .root()
        .ok_or_else(|| StoreError::InvalidPackage("package has no root part".into()))?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let xml_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let binary_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // Content types first
    let content_types = collect_content_types(pkg)?;
    zip.start_file("[Content_Types].xml", xml_options)?;
    zip.write_all(content_types.to_xml().as_bytes())?;

    // Package-level rels pointing at the root part
    let root_rels = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{}" Target="{}"/>"#,
            "</Relationships>"
        ),
        relationship_types::PRESENTATION,
        pkg.part(root)?.path
    );
    zip.start_file("_rels/.rels", xml_options)?;
    zip.write_all(root_rels.as_bytes())?;

    // Every part, then its rels when it has any
    for id in pkg.part_ids().collect::<Vec<_>>() {
        let part = pkg.part(id)?;
        let path = part.path.clone();
        if part.kind.is_binary() {
            zip.start_file(&path, binary_options)?;
            zip.write_all(part.bytes(id)?)?;
        } else {
            zip.start_file(&path, xml_options)?;
            zip.write_all(part.tree(id)?.to_document().as_bytes())?;
        }

        if !pkg.rels(id)?.is_empty() {
            let rels_xml = rels_to_xml(pkg, id, &path)?;
            zip.start_file(rels_path_for(&path), xml_options)?;
            zip.write_all(rels_xml.as_bytes())?;
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Build the content-type table from the parts actually present.
/// Binary payloads get extension defaults where consistent, otherwise a
/// per-part override; XML parts always get overrides.
fn collect_content_types(pkg: &Package) -> StoreResult<ContentTypes> {
    let mut ct = ContentTypes::new();

    for id in pkg.part_ids() {
        let part = pkg.part(id)?;
        let Some(content_type) = part.effective_content_type() else {
            continue;
        };
        if part.kind.is_binary() {
            let ext = part
                .path
                .rsplit('.')
                .next()
                .unwrap_or("bin")
                .to_lowercase();
            if !ct.add_default(&ext, content_type) {
                ct.add_override(&part.path, content_type);
            }
        } else if content_type != XML_CONTENT_TYPE && content_type != RELS_CONTENT_TYPE {
            ct.add_override(&part.path, content_type);
        }
    }

    Ok(ct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::create_empty;
    use crate::reader::open_package;
    use deck_model::{Part, PartKind, XmlElement};

    #[test]
    fn test_save_and_reopen_empty() {
        let mut pkg = create_empty();
        let bytes = save_package(&mut pkg).unwrap();
        let reopened = open_package(&bytes).unwrap();
        assert!(reopened.root().is_some());
        assert_eq!(
            reopened.part(reopened.root().unwrap()).unwrap().kind,
            PartKind::Presentation
        );
    }

    #[test]
    fn test_save_and_reopen_with_slide() {
        let mut pkg = create_empty();
        let master = pkg.add_part(Part::xml(
            PartKind::SlideMaster,
            "ppt/slideMasters/slideMaster1.xml",
            XmlElement::new("p:sldMaster"),
        ));
        let slide = pkg.add_part(Part::xml(
            PartKind::Slide,
            "ppt/slides/slide1.xml",
            XmlElement::new("p:sld"),
        ));
        let media = pkg.add_part(Part::binary(
            PartKind::Media,
            "ppt/media/image1.png",
            "image/png",
            vec![0x89, 0x50, 0x4E, 0x47],
        ));
        pkg.rels_mut(slide)
            .unwrap()
            .add_internal(relationship_types::IMAGE, media);
        pkg.master_ids.push(2147483648, master);
        pkg.slide_ids.push(256, slide);

        let bytes = save_package(&mut pkg).unwrap();
        let reopened = open_package(&bytes).unwrap();

        assert_eq!(reopened.slide_ids.len(), 1);
        assert_eq!(reopened.master_ids.len(), 1);
        assert_eq!(reopened.slide_ids.entries()[0].num_id, 256);

        let slide_id = reopened.slide_ids.entries()[0].part;
        let slide_part = reopened.part(slide_id).unwrap();
        assert_eq!(slide_part.kind, PartKind::Slide);

        let image_rel = reopened
            .rels(slide_id)
            .unwrap()
            .get_by_type(relationship_types::IMAGE)
            .unwrap();
        let media_id = image_rel.target.part().unwrap();
        let media_part = reopened.part(media_id).unwrap();
        assert_eq!(media_part.kind, PartKind::Media);
        assert_eq!(media_part.bytes(media_id).unwrap(), &[0x89, 0x50, 0x4E, 0x47]);
    }
}
