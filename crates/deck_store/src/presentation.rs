//! The presentation root part: id lists and canonical child order

use crate::error::{StoreError, StoreResult};
use deck_model::{
    relationship_types, Package, PackageKind, Part, PartId, PartKind, XmlElement, XmlNode,
};

/// Schema-mandated order of `p:presentation` children. Merge operations
/// append in discovery order, so the final tree must be re-sorted.
const CHILD_ORDER: &[&str] = &[
    "p:sldMasterIdLst",
    "p:notesMasterIdLst",
    "p:handoutMasterIdLst",
    "p:sldIdLst",
    "p:sldSz",
    "p:notesSz",
    "p:smartTags",
    "p:embeddedFontLst",
    "p:custShowLst",
    "p:photoAlbum",
    "p:custDataLst",
    "p:kinsoku",
    "p:defaultTextStyle",
    "p:modifyVerifier",
    "p:extLst",
];

/// Rank of a `p:presentation` child in the canonical sequence
pub fn canonical_rank(name: &str) -> Option<usize> {
    CHILD_ORDER.iter().position(|n| *n == name)
}

/// Stable-sort the root element's children into the canonical sequence.
/// Unranked children keep their relative order after the ranked ones.
pub fn normalize_root_order(tree: &mut XmlElement) {
    let fallback = CHILD_ORDER.len();
    tree.children.sort_by_key(|child| match child {
        XmlNode::Element(e) => canonical_rank(&e.name).unwrap_or(fallback),
        XmlNode::Text(_) => fallback,
    });
}

/// Create a minimal empty deck package: a presentation root part with
/// empty id lists.
pub fn create_empty() -> Package {
    let mut pkg = Package::new(PackageKind::Presentation);
    let tree = XmlElement::new("p:presentation")
        .with_attr(
            "xmlns:a",
            "http://schemas.openxmlformats.org/drawingml/2006/main",
        )
        .with_attr(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )
        .with_attr(
            "xmlns:p",
            "http://schemas.openxmlformats.org/presentationml/2006/main",
        )
        .with_child(
            XmlElement::new("p:sldSz")
                .with_attr("cx", "12192000")
                .with_attr("cy", "6858000"),
        )
        .with_child(
            XmlElement::new("p:notesSz")
                .with_attr("cx", "6858000")
                .with_attr("cy", "9144000"),
        );
    let root = pkg.add_part(Part::xml(PartKind::Presentation, "ppt/presentation.xml", tree));
    pkg.set_root(root);
    pkg
}

/// Rebuild `p:sldMasterIdLst` and `p:sldIdLst` inside the root tree from
/// the package's ordered id lists, creating root relationships as needed.
pub fn sync_id_lists(pkg: &mut Package) -> StoreResult<()> {
    let root = pkg
        .root()
        .ok_or_else(|| StoreError::InvalidPackage("package has no root part".into()))?;

    let master_list = build_id_list(pkg, root, "p:sldMasterIdLst", "p:sldMasterId", true)?;
    let slide_list = build_id_list(pkg, root, "p:sldIdLst", "p:sldId", false)?;

    let mut tree = pkg.checkout_tree(root)?;
    replace_or_insert(&mut tree, master_list);
    replace_or_insert(&mut tree, slide_list);
    pkg.commit_tree(root, tree)?;
    Ok(())
}

fn build_id_list(
    pkg: &mut Package,
    root: PartId,
    list_name: &str,
    entry_name: &str,
    masters: bool,
) -> StoreResult<XmlElement> {
    let entries: Vec<_> = if masters {
        pkg.master_ids.entries().to_vec()
    } else {
        pkg.slide_ids.entries().to_vec()
    };
    let rel_type = if masters {
        relationship_types::SLIDE_MASTER
    } else {
        relationship_types::SLIDE
    };

    let mut list = XmlElement::new(list_name);
    for entry in entries {
        let rel_id = match pkg.rels(root)?.find_internal(entry.part) {
            Some(rel) => rel.id.clone(),
            None => pkg.rels_mut(root)?.add_internal(rel_type, entry.part),
        };
        list.children.push(XmlNode::Element(
            XmlElement::new(entry_name)
                .with_attr("id", entry.num_id.to_string())
                .with_attr("r:id", rel_id),
        ));
    }
    Ok(list)
}

fn replace_or_insert(tree: &mut XmlElement, list: XmlElement) {
    let pos = tree
        .children
        .iter()
        .position(|c| matches!(c, XmlNode::Element(e) if e.name == list.name));
    match pos {
        Some(i) => tree.children[i] = XmlNode::Element(list),
        None => {
            tree.children.insert(0, XmlNode::Element(list));
            normalize_root_order(tree);
        }
    }
}

/// Read the two ordered id lists out of the root tree into the package,
/// resolving `r:id` values through the root part's relationships.
pub fn extract_id_lists(pkg: &mut Package) -> StoreResult<()> {
    let root = pkg
        .root()
        .ok_or_else(|| StoreError::InvalidPackage("package has no root part".into()))?;

    let tree = pkg.part(root)?.tree(root)?.clone();
    for (list_name, entry_name, masters) in [
        ("p:sldMasterIdLst", "p:sldMasterId", true),
        ("p:sldIdLst", "p:sldId", false),
    ] {
        let Some(list) = tree.child(list_name) else {
            continue;
        };
        for entry in list.child_elements().filter(|e| e.name == entry_name) {
            let num_id = entry
                .attr("id")
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| {
                    StoreError::InvalidPackage(format!("{} entry without numeric id", list_name))
                })?;
            let rel_id = entry.attr("r:id").ok_or_else(|| {
                StoreError::InvalidPackage(format!("{} entry without r:id", list_name))
            })?;
            let target = pkg
                .resolve(root, rel_id)?
                .target
                .part()
                .ok_or_else(|| {
                    StoreError::InvalidPackage(format!("{} entry targets an external URI", list_name))
                })?;
            if masters {
                pkg.master_ids.push(num_id, target);
            } else {
                pkg.slide_ids.push(num_id, target);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_empty_has_root() {
        let pkg = create_empty();
        let root = pkg.root().unwrap();
        assert_eq!(pkg.part(root).unwrap().kind, PartKind::Presentation);
        assert!(pkg.slide_ids.is_empty());
        assert!(pkg.master_ids.is_empty());
    }

    #[test]
    fn test_normalize_root_order() {
        let mut tree = XmlElement::new("p:presentation")
            .with_child(XmlElement::new("p:sldSz"))
            .with_child(XmlElement::new("p:sldIdLst"))
            .with_child(XmlElement::new("p:sldMasterIdLst"));
        normalize_root_order(&mut tree);
        let names: Vec<_> = tree.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["p:sldMasterIdLst", "p:sldIdLst", "p:sldSz"]);
    }

    #[test]
    fn test_sync_and_extract_roundtrip() {
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
        pkg.master_ids.push(2147483648, master);
        pkg.slide_ids.push(256, slide);

        sync_id_lists(&mut pkg).unwrap();

        // Wipe the lists and re-read them from the tree
        let mut reread = pkg.clone();
        reread.slide_ids = Default::default();
        reread.master_ids = Default::default();
        extract_id_lists(&mut reread).unwrap();

        assert_eq!(reread.slide_ids.entries(), pkg.slide_ids.entries());
        assert_eq!(reread.master_ids.entries(), pkg.master_ids.entries());
    }
}
