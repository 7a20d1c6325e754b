//! Merge orchestration: assemble a fresh destination deck from slices of
//! source decks
//!
//! Sources are processed strictly in order and never mutated. The first
//! source also seeds the destination's package-level satellites (view and
//! presentation properties, notes and handout masters, slide size), so
//! the merged deck inherits its overall look from source zero.

use crate::error::{MergeError, MergeResult, StructuralError, StructuralResult};
use crate::graft::{clone_xml_part, graft, GraftContext};
use crate::id_alloc::{IdAllocator, IdSpace};
use crate::masters::{ensure_master, layout_master, layout_name, resolve_layout, slide_layout};
use crate::media_cache::MediaCache;
use crate::ref_table::{rule_for, MissingPolicy};
use deck_model::{relationship_types, Package, Part, PartId, PartKind, RelTarget, XmlElement, XmlNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slice and policy options for one source deck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Zero-based index of the first slide to take
    pub start: usize,
    /// Number of slides to take; `None` takes through the end
    pub count: Option<usize>,
    /// Reuse an existing destination master when its theme name matches
    pub share_master: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            start: 0,
            count: None,
            share_master: true,
        }
    }
}

/// One source deck plus the options governing its contribution
pub struct MergeSource {
    pub package: Package,
    pub options: SourceOptions,
}

impl MergeSource {
    /// Take the whole deck with default policies
    pub fn new(package: Package) -> Self {
        Self {
            package,
            options: SourceOptions::default(),
        }
    }

    pub fn with_options(package: Package, options: SourceOptions) -> Self {
        Self { package, options }
    }
}

/// Merge the given sources into a fresh destination package.
///
/// Failures during a source's pass carry that source's index; the
/// destination is abandoned on error, never returned half-built.
pub fn merge(sources: &[MergeSource]) -> MergeResult<Package> {
    let mut dest = deck_store::create_empty();
    let mut cache = MediaCache::new();
    let mut alloc = IdAllocator::new();

    for (index, source) in sources.iter().enumerate() {
        tracing::debug!(
            "merging source {} ({} slides)",
            index,
            source.package.slide_ids.len()
        );
        merge_one(&mut dest, &mut cache, &mut alloc, source, index == 0)
            .map_err(|e| MergeError::at(index, e))?;
    }

    finalize(&mut dest)?;
    Ok(dest)
}

/// Merge and serialize the destination to container bytes in one call
pub fn merge_to_bytes(sources: &[MergeSource]) -> MergeResult<Vec<u8>> {
    let mut dest = merge(sources)?;
    let bytes = deck_store::save_package(&mut dest).map_err(StructuralError::Store)?;
    Ok(bytes)
}

fn merge_one(
    dest: &mut Package,
    cache: &mut MediaCache,
    alloc: &mut IdAllocator,
    source: &MergeSource,
    first: bool,
) -> StructuralResult<()> {
    let src = &source.package;
    let opts = &source.options;
    let mut ctx = GraftContext::new(dest, cache);

    if first {
        copy_satellites(&mut ctx, src)?;
    }
    merge_embedded_fonts(&mut ctx, src)?;

    // Source master -> destination master, memoized per source so slides
    // sharing a master do not trigger repeated copies
    let mut master_memo: HashMap<PartId, PartId> = HashMap::new();

    let entries = src.slide_ids.entries().to_vec();
    let start = opts.start.min(entries.len());
    let end = match opts.count {
        Some(count) => start.saturating_add(count).min(entries.len()),
        None => entries.len(),
    };

    for entry in &entries[start..end] {
        let src_slide = entry.part;
        let src_layout = slide_layout(src, src_slide)?;
        let src_master = layout_master(src, src_layout)?;

        let dest_master = match master_memo.get(&src_master) {
            Some(&m) => m,
            None => {
                let m = ensure_master(&mut ctx, alloc, src, src_master, opts.share_master)?;
                master_memo.insert(src_master, m);
                m
            }
        };
        let wanted = layout_name(src, src_layout)?;
        let dest_layout = resolve_layout(ctx.dest, dest_master, wanted.as_deref())?;

        let dest_slide = clone_xml_part(ctx.dest, src, src_slide)?;
        ctx.dest
            .rels_mut(dest_slide)?
            .add_internal(relationship_types::SLIDE_LAYOUT, dest_layout);
        graft(&mut ctx, src, src_slide, dest_slide)?;

        let num_id = alloc.next(IdSpace::Slide, ctx.dest);
        ctx.dest.slide_ids.push(num_id, dest_slide);

        copy_notes(&mut ctx, src, src_slide, dest_slide)?;
        copy_comments(&mut ctx, alloc, src, src_slide, dest_slide)?;
        merge_table_styles(ctx.dest, src, dest_slide)?;
    }
    Ok(())
}

/// Rebuild the root id lists and restore the schema-mandated child order
fn finalize(dest: &mut Package) -> StructuralResult<()> {
    deck_store::sync_id_lists(dest)?;
    let root = root_of(dest)?;
    let mut tree = dest.checkout_tree(root)?;
    deck_store::normalize_root_order(&mut tree);
    dest.commit_tree(root, tree)?;
    Ok(())
}

fn root_of(pkg: &Package) -> StructuralResult<PartId> {
    pkg.root()
        .ok_or_else(|| StructuralError::ElementMissing("presentation root part".into()))
}

/// Package-level parts copied once, from the first source only
fn copy_satellites(ctx: &mut GraftContext, src: &Package) -> StructuralResult<()> {
    let dest_root = root_of(ctx.dest)?;

    for (kind, rel_type) in [
        (PartKind::PresProps, relationship_types::PRES_PROPS),
        (PartKind::ViewProps, relationship_types::VIEW_PROPS),
        (PartKind::TableStyles, relationship_types::TABLE_STYLES),
    ] {
        if let Some(part) = src.find_part_of_kind(kind) {
            let copied = clone_xml_part(ctx.dest, src, part)?;
            graft(ctx, src, part, copied)?;
            ctx.dest.rels_mut(dest_root)?.add_internal(rel_type, copied);
        }
    }

    if let Some(notes_master) = src.find_part_of_kind(PartKind::NotesMaster) {
        let copied = copy_with_theme(ctx, src, notes_master)?;
        let rel_id = ctx
            .dest
            .rels_mut(dest_root)?
            .add_internal(relationship_types::NOTES_MASTER, copied);
        attach_singleton_list(ctx.dest, dest_root, "p:notesMasterIdLst", "p:notesMasterId", &rel_id)?;
    }
    if let Some(handout_master) = src.find_part_of_kind(PartKind::HandoutMaster) {
        let copied = copy_with_theme(ctx, src, handout_master)?;
        let rel_id = ctx
            .dest
            .rels_mut(dest_root)?
            .add_internal(relationship_types::HANDOUT_MASTER, copied);
        attach_singleton_list(
            ctx.dest,
            dest_root,
            "p:handoutMasterIdLst",
            "p:handoutMasterId",
            &rel_id,
        )?;
    }

    adopt_root_children(ctx.dest, src, &["p:sldSz", "p:notesSz", "p:defaultTextStyle"])
}

/// Copy a master-like part together with its theme. Themes are attached
/// through a bare relationship, not a reference attribute, so the copier
/// never discovers them on its own.
fn copy_with_theme(
    ctx: &mut GraftContext,
    src: &Package,
    src_part: PartId,
) -> StructuralResult<PartId> {
    let copied = clone_xml_part(ctx.dest, src, src_part)?;
    graft(ctx, src, src_part, copied)?;
    if let Some(src_theme) = src
        .rels(src_part)?
        .get_by_type(relationship_types::THEME)
        .and_then(|r| r.target.part())
    {
        let dest_theme = clone_xml_part(ctx.dest, src, src_theme)?;
        graft(ctx, src, src_theme, dest_theme)?;
        ctx.dest
            .rels_mut(copied)?
            .add_internal(relationship_types::THEME, dest_theme);
    }
    Ok(copied)
}

/// Replace or insert a one-entry id list (`p:notesMasterIdLst` and the
/// handout equivalent) in the root tree
fn attach_singleton_list(
    dest: &mut Package,
    root: PartId,
    list_name: &str,
    entry_name: &str,
    rel_id: &str,
) -> StructuralResult<()> {
    let list = XmlElement::new(list_name)
        .with_child(XmlElement::new(entry_name).with_attr("r:id", rel_id));
    let mut tree = dest.checkout_tree(root)?;
    let pos = tree
        .children
        .iter()
        .position(|c| matches!(c, XmlNode::Element(e) if e.name == list_name));
    match pos {
        Some(i) => tree.children[i] = XmlNode::Element(list),
        None => tree.children.push(XmlNode::Element(list)),
    }
    dest.commit_tree(root, tree)?;
    Ok(())
}

/// Adopt selected root children (slide size and friends) from a source,
/// replacing any defaults already present
fn adopt_root_children(
    dest: &mut Package,
    src: &Package,
    names: &[&str],
) -> StructuralResult<()> {
    let src_root = root_of(src)?;
    let src_tree = src.part(src_root)?.tree(src_root)?.clone();
    let dest_root = root_of(dest)?;
    let mut tree = dest.checkout_tree(dest_root)?;
    for name in names {
        if let Some(child) = src_tree.child(name) {
            let pos = tree
                .children
                .iter()
                .position(|c| matches!(c, XmlNode::Element(e) if e.name == *name));
            match pos {
                Some(i) => tree.children[i] = XmlNode::Element(child.clone()),
                None => tree.children.push(XmlNode::Element(child.clone())),
            }
        }
    }
    dest.commit_tree(dest_root, tree)?;
    Ok(())
}

/// Merge a source's embedded font list into the destination root,
/// deduplicating by typeface and copying font payloads through the cache
fn merge_embedded_fonts(ctx: &mut GraftContext, src: &Package) -> StructuralResult<()> {
    let src_root = root_of(src)?;
    let src_tree = src.part(src_root)?.tree(src_root)?;
    let Some(src_list) = src_tree.child("p:embeddedFontLst") else {
        return Ok(());
    };
    let src_fonts: Vec<XmlElement> = src_list.child_elements().cloned().collect();

    let dest_root = root_of(ctx.dest)?;
    let existing: Vec<String> = {
        let tree = ctx.dest.part(dest_root)?.tree(dest_root)?;
        tree.child("p:embeddedFontLst")
            .map(|list| {
                list.child_elements()
                    .filter_map(|f| f.child("p:font"))
                    .filter_map(|f| f.attr("typeface"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut appended = Vec::new();
    for font in src_fonts {
        let typeface = font
            .child("p:font")
            .and_then(|f| f.attr("typeface"))
            .unwrap_or("")
            .to_string();
        if existing.iter().any(|t| *t == typeface) {
            continue;
        }
        let mut cloned = font;
        rewrite_font_refs(&mut cloned, ctx, src, src_root, dest_root)?;
        appended.push(cloned);
    }
    if appended.is_empty() {
        return Ok(());
    }

    let mut tree = ctx.dest.checkout_tree(dest_root)?;
    if tree.child("p:embeddedFontLst").is_none() {
        tree.children
            .push(XmlNode::Element(XmlElement::new("p:embeddedFontLst")));
    }
    if let Some(list) = tree.child_mut("p:embeddedFontLst") {
        for font in appended {
            list.children.push(XmlNode::Element(font));
        }
    }
    ctx.dest.commit_tree(dest_root, tree)?;
    Ok(())
}

/// Rewrite font payload references inside one `p:embeddedFont` element.
/// These live on the root part, so the generic per-part copy path does
/// not apply; payloads still go through the dedup cache.
fn rewrite_font_refs(
    elem: &mut XmlElement,
    ctx: &mut GraftContext,
    src: &Package,
    src_root: PartId,
    dest_root: PartId,
) -> StructuralResult<()> {
    if let Some(rule) = rule_for(&elem.name) {
        for slot in rule.slots {
            let Some(value) = elem.attr(slot.attr).map(str::to_string) else {
                continue;
            };
            match src.rels(src_root)?.get(&value).cloned() {
                None => match slot.on_missing {
                    MissingPolicy::StripAttribute => {
                        elem.remove_attr(slot.attr);
                    }
                    MissingPolicy::Fail => {
                        return Err(StructuralError::RelationshipMissing {
                            owner_path: src.part(src_root)?.path.clone(),
                            rel_id: value,
                        });
                    }
                },
                Some(rel) => {
                    let new_id = match &rel.target {
                        RelTarget::External(uri) => {
                            ctx.cache
                                .acquire_external(ctx.dest, dest_root, uri, &rel.rel_type)?
                        }
                        RelTarget::Internal(target) => {
                            ctx.cache
                                .acquire(ctx.dest, src, *target, dest_root, &rel.rel_type)?
                        }
                    };
                    elem.set_attr(slot.attr, new_id);
                }
            }
        }
    }
    for child in elem.child_elements_mut() {
        rewrite_font_refs(child, ctx, src, src_root, dest_root)?;
    }
    Ok(())
}

/// Copy a slide's notes page, wiring the back-reference and the shared
/// notes master
fn copy_notes(
    ctx: &mut GraftContext,
    src: &Package,
    src_slide: PartId,
    dest_slide: PartId,
) -> StructuralResult<()> {
    let Some(src_notes) = src
        .rels(src_slide)?
        .get_by_type(relationship_types::NOTES_SLIDE)
        .and_then(|r| r.target.part())
    else {
        return Ok(());
    };
    let dest_notes = clone_xml_part(ctx.dest, src, src_notes)?;
    graft(ctx, src, src_notes, dest_notes)?;
    ctx.dest
        .rels_mut(dest_slide)?
        .add_internal(relationship_types::NOTES_SLIDE, dest_notes);
    ctx.dest
        .rels_mut(dest_notes)?
        .add_internal(relationship_types::SLIDE, dest_slide);
    if let Some(notes_master) = ctx.dest.find_part_of_kind(PartKind::NotesMaster) {
        ctx.dest
            .rels_mut(dest_notes)?
            .add_internal(relationship_types::NOTES_MASTER, notes_master);
    }
    Ok(())
}

/// Copy a slide's comments, remapping author ids into the destination's
/// merged author table
fn copy_comments(
    ctx: &mut GraftContext,
    alloc: &mut IdAllocator,
    src: &Package,
    src_slide: PartId,
    dest_slide: PartId,
) -> StructuralResult<()> {
    let Some(src_comments) = src
        .rels(src_slide)?
        .get_by_type(relationship_types::COMMENTS)
        .and_then(|r| r.target.part())
    else {
        return Ok(());
    };
    let author_map = remap_authors(ctx.dest, alloc, src)?;

    let dest_comments = clone_xml_part(ctx.dest, src, src_comments)?;
    graft(ctx, src, src_comments, dest_comments)?;
    ctx.dest
        .rels_mut(dest_slide)?
        .add_internal(relationship_types::COMMENTS, dest_comments);

    let mut tree = ctx.dest.checkout_tree(dest_comments)?;
    tree.visit_mut(&mut |e| {
        if e.name == "p:cm" {
            if let Some(old) = e.attr("authorId").map(str::to_string) {
                if let Some(new) = author_map.get(&old) {
                    e.set_attr("authorId", new.clone());
                }
            }
        }
    });
    ctx.dest.commit_tree(dest_comments, tree)?;
    Ok(())
}

/// Merge a source's comment authors into the destination table. Authors
/// are matched by initials; unmatched authors get a fresh id. Returns the
/// old-id to new-id mapping for this source.
fn remap_authors(
    dest: &mut Package,
    alloc: &mut IdAllocator,
    src: &Package,
) -> StructuralResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    let Some(src_part) = src.find_part_of_kind(PartKind::CommentAuthors) else {
        return Ok(map);
    };
    let src_tree = src.part(src_part)?.tree(src_part)?.clone();
    let dest_part = ensure_authors_part(dest)?;

    for author in src_tree.child_elements().filter(|e| e.name == "p:cmAuthor") {
        let Some(old_id) = author.attr("id") else {
            continue;
        };
        let initials = author.attr("initials").unwrap_or("").to_string();
        let existing = {
            let tree = dest.part(dest_part)?.tree(dest_part)?;
            tree.child_elements()
                .find(|e| e.attr("initials") == Some(initials.as_str()))
                .and_then(|e| e.attr("id"))
                .map(str::to_string)
        };
        let new_id = match existing {
            Some(id) => id,
            None => {
                let num = alloc.next(IdSpace::CommentAuthor, dest);
                let mut cloned = author.clone();
                cloned.set_attr("id", num.to_string());
                let mut tree = dest.checkout_tree(dest_part)?;
                tree.children.push(XmlNode::Element(cloned));
                dest.commit_tree(dest_part, tree)?;
                num.to_string()
            }
        };
        map.insert(old_id.to_string(), new_id);
    }
    Ok(map)
}

fn ensure_authors_part(dest: &mut Package) -> StructuralResult<PartId> {
    if let Some(part) = dest.find_part_of_kind(PartKind::CommentAuthors) {
        return Ok(part);
    }
    let path = dest.next_path(PartKind::CommentAuthors);
    let part = dest.add_part(Part::xml(
        PartKind::CommentAuthors,
        path,
        XmlElement::new("p:cmAuthorLst"),
    ));
    let root = root_of(dest)?;
    dest.rels_mut(root)?
        .add_internal(relationship_types::COMMENT_AUTHORS, part);
    Ok(part)
}

/// Pull the table styles a copied slide references into the destination's
/// shared table-styles part, keyed by style GUID
fn merge_table_styles(
    dest: &mut Package,
    src: &Package,
    dest_slide: PartId,
) -> StructuralResult<()> {
    let Some(src_styles) = src.find_part_of_kind(PartKind::TableStyles) else {
        return Ok(());
    };

    let mut guids = Vec::new();
    collect_table_style_ids(dest.part(dest_slide)?.tree(dest_slide)?, &mut guids);
    if guids.is_empty() {
        return Ok(());
    }

    let src_tree = src.part(src_styles)?.tree(src_styles)?.clone();
    let dest_part = ensure_table_styles_part(dest, src_tree.attr("def"))?;
    let mut dest_tree = dest.checkout_tree(dest_part)?;
    for guid in guids {
        let present = dest_tree
            .child_elements()
            .any(|e| e.attr("styleId") == Some(guid.as_str()));
        if present {
            continue;
        }
        if let Some(style) = src_tree
            .child_elements()
            .find(|e| e.attr("styleId") == Some(guid.as_str()))
        {
            dest_tree.children.push(XmlNode::Element(style.clone()));
        }
    }
    dest.commit_tree(dest_part, dest_tree)?;
    Ok(())
}

fn collect_table_style_ids(elem: &XmlElement, out: &mut Vec<String>) {
    if elem.name == "a:tableStyleId" {
        let guid = elem.text();
        let guid = guid.trim();
        if !guid.is_empty() && !out.iter().any(|g| g == guid) {
            out.push(guid.to_string());
        }
    }
    for child in elem.child_elements() {
        collect_table_style_ids(child, out);
    }
}

fn ensure_table_styles_part(
    dest: &mut Package,
    default_style: Option<&str>,
) -> StructuralResult<PartId> {
    if let Some(part) = dest.find_part_of_kind(PartKind::TableStyles) {
        return Ok(part);
    }
    let mut tree = XmlElement::new("a:tblStyleLst").with_attr(
        "xmlns:a",
        "http://schemas.openxmlformats.org/drawingml/2006/main",
    );
    if let Some(def) = default_style {
        tree.set_attr("def", def);
    }
    let path = dest.next_path(PartKind::TableStyles);
    let part = dest.add_part(Part::xml(PartKind::TableStyles, path, tree));
    let root = root_of(dest)?;
    dest.rels_mut(root)?
        .add_internal(relationship_types::TABLE_STYLES, part);
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal but well-formed source deck: theme, master, one layout,
    /// `n` slides attached to that layout
    fn source_deck(theme: &str, n: usize) -> Package {
        let mut pkg = deck_store::create_empty();
        let theme_part = pkg.add_part(Part::xml(
            PartKind::Theme,
            "ppt/theme/theme1.xml",
            XmlElement::new("a:theme").with_attr("name", theme),
        ));
        let master = pkg.add_part(Part::xml(
            PartKind::SlideMaster,
            "ppt/slideMasters/slideMaster1.xml",
            XmlElement::new("p:sldMaster").with_child(XmlElement::new("p:cSld")),
        ));
        pkg.rels_mut(master)
            .unwrap()
            .add_internal(relationship_types::THEME, theme_part);
        let layout = pkg.add_part(Part::xml(
            PartKind::SlideLayout,
            "ppt/slideLayouts/slideLayout1.xml",
            XmlElement::new("p:sldLayout")
                .with_child(XmlElement::new("p:cSld").with_attr("name", "Title")),
        ));
        pkg.rels_mut(layout)
            .unwrap()
            .add_internal(relationship_types::SLIDE_MASTER, master);
        pkg.rels_mut(master)
            .unwrap()
            .add_internal(relationship_types::SLIDE_LAYOUT, layout);
        pkg.master_ids.push(0x8000_0000, master);

        for i in 0..n {
            let slide = pkg.add_part(Part::xml(
                PartKind::Slide,
                format!("ppt/slides/slide{}.xml", i + 1),
                XmlElement::new("p:sld").with_child(
                    XmlElement::new("p:cSld").with_attr("name", format!("s{}", i)),
                ),
            ));
            pkg.rels_mut(slide)
                .unwrap()
                .add_internal(relationship_types::SLIDE_LAYOUT, layout);
            pkg.slide_ids.push(256 + i as u32, slide);
        }
        pkg
    }

    #[test]
    fn test_merge_two_sources_appends_in_order() {
        let merged = merge(&[
            MergeSource::new(source_deck("Office", 2)),
            MergeSource::new(source_deck("Office", 3)),
        ])
        .unwrap();

        assert_eq!(merged.slide_ids.len(), 5);
        let nums: Vec<u32> = merged.slide_ids.iter().map(|e| e.num_id).collect();
        assert_eq!(nums, vec![256, 257, 258, 259, 260]);
        // Same theme name: one master serves both sources
        assert_eq!(merged.master_ids.len(), 1);
    }

    #[test]
    fn test_slice_clamps_past_end() {
        let merged = merge(&[MergeSource::with_options(
            source_deck("Office", 5),
            SourceOptions {
                start: 1,
                count: Some(2),
                share_master: true,
            },
        )])
        .unwrap();
        assert_eq!(merged.slide_ids.len(), 2);

        // Start beyond the deck contributes nothing instead of failing
        let empty = merge(&[MergeSource::with_options(
            source_deck("Office", 2),
            SourceOptions {
                start: 9,
                count: Some(3),
                share_master: true,
            },
        )])
        .unwrap();
        assert_eq!(empty.slide_ids.len(), 0);
    }

    #[test]
    fn test_count_none_takes_through_end() {
        let merged = merge(&[MergeSource::with_options(
            source_deck("Office", 4),
            SourceOptions {
                start: 2,
                count: None,
                share_master: true,
            },
        )])
        .unwrap();
        assert_eq!(merged.slide_ids.len(), 2);
    }

    #[test]
    fn test_share_master_disabled_copies_per_source() {
        let merged = merge(&[
            MergeSource::with_options(
                source_deck("Office", 1),
                SourceOptions {
                    share_master: false,
                    ..Default::default()
                },
            ),
            MergeSource::with_options(
                source_deck("Office", 1),
                SourceOptions {
                    share_master: false,
                    ..Default::default()
                },
            ),
        ])
        .unwrap();
        assert_eq!(merged.master_ids.len(), 2);
    }

    #[test]
    fn test_error_carries_source_index() {
        // Second source has a slide with no layout relationship
        let good = source_deck("Office", 1);
        let mut bad = deck_store::create_empty();
        let orphan = bad.add_part(Part::xml(
            PartKind::Slide,
            "ppt/slides/slide1.xml",
            XmlElement::new("p:sld"),
        ));
        bad.slide_ids.push(256, orphan);

        let err = merge(&[MergeSource::new(good), MergeSource::new(bad)]).unwrap_err();
        assert_eq!(err.source_index(), Some(1));
    }

    #[test]
    fn test_satellites_come_from_first_source_only() {
        let mut first = source_deck("Office", 1);
        let props = first.add_part(Part::xml(
            PartKind::PresProps,
            "ppt/presProps1.xml",
            XmlElement::new("p:presentationPr").with_attr("marker", "first"),
        ));
        let root = first.root().unwrap();
        first
            .rels_mut(root)
            .unwrap()
            .add_internal(relationship_types::PRES_PROPS, props);

        let mut second = source_deck("Facet", 1);
        let props2 = second.add_part(Part::xml(
            PartKind::PresProps,
            "ppt/presProps1.xml",
            XmlElement::new("p:presentationPr").with_attr("marker", "second"),
        ));
        let root2 = second.root().unwrap();
        second
            .rels_mut(root2)
            .unwrap()
            .add_internal(relationship_types::PRES_PROPS, props2);

        let merged = merge(&[MergeSource::new(first), MergeSource::new(second)]).unwrap();
        let props: Vec<_> = merged.parts_of_kind(PartKind::PresProps).collect();
        assert_eq!(props.len(), 1);
        let (id, part) = props[0];
        assert_eq!(part.tree(id).unwrap().attr("marker"), Some("first"));
    }

    #[test]
    fn test_comment_authors_merged_by_initials() {
        fn with_comments(mut pkg: Package, author_id: &str, initials: &str) -> Package {
            let authors = pkg.add_part(Part::xml(
                PartKind::CommentAuthors,
                "ppt/commentAuthors1.xml",
                XmlElement::new("p:cmAuthorLst").with_child(
                    XmlElement::new("p:cmAuthor")
                        .with_attr("id", author_id)
                        .with_attr("name", "Pat")
                        .with_attr("initials", initials),
                ),
            ));
            let root = pkg.root().unwrap();
            pkg.rels_mut(root)
                .unwrap()
                .add_internal(relationship_types::COMMENT_AUTHORS, authors);

            let slide = pkg.slide_ids.entries()[0].part;
            let comments = pkg.add_part(Part::xml(
                PartKind::Comments,
                "ppt/comments/comment1.xml",
                XmlElement::new("p:cmLst")
                    .with_child(XmlElement::new("p:cm").with_attr("authorId", author_id)),
            ));
            pkg.rels_mut(slide)
                .unwrap()
                .add_internal(relationship_types::COMMENTS, comments);
            pkg
        }

        let first = with_comments(source_deck("Office", 1), "7", "PK");
        let second = with_comments(source_deck("Office", 1), "3", "PK");
        let merged = merge(&[MergeSource::new(first), MergeSource::new(second)]).unwrap();

        // One author entry survives; both comment parts point at it
        let authors = merged.find_part_of_kind(PartKind::CommentAuthors).unwrap();
        let author_tree = merged.part(authors).unwrap().tree(authors).unwrap();
        assert_eq!(author_tree.child_elements().count(), 1);
        let merged_id = author_tree.child("p:cmAuthor").unwrap().attr("id").unwrap();

        for (id, part) in merged.parts_of_kind(PartKind::Comments) {
            let cm = part.tree(id).unwrap().find("p:cm").unwrap();
            assert_eq!(cm.attr("authorId"), Some(merged_id));
        }
    }

    #[test]
    fn test_notes_slide_copied_with_back_reference() {
        let mut src = source_deck("Office", 1);
        let slide = src.slide_ids.entries()[0].part;
        let notes = src.add_part(Part::xml(
            PartKind::NotesSlide,
            "ppt/notesSlides/notesSlide1.xml",
            XmlElement::new("p:notes").with_child(XmlElement::new("p:cSld")),
        ));
        src.rels_mut(slide)
            .unwrap()
            .add_internal(relationship_types::NOTES_SLIDE, notes);
        src.rels_mut(notes)
            .unwrap()
            .add_internal(relationship_types::SLIDE, slide);

        let merged = merge(&[MergeSource::new(src)]).unwrap();

        let dest_slide = merged.slide_ids.entries()[0].part;
        let dest_notes = merged
            .rels(dest_slide)
            .unwrap()
            .get_by_type(relationship_types::NOTES_SLIDE)
            .unwrap()
            .target
            .part()
            .unwrap();
        assert_eq!(merged.part(dest_notes).unwrap().kind, PartKind::NotesSlide);

        // The back-reference points at the copied slide, not the source one
        let back = merged
            .rels(dest_notes)
            .unwrap()
            .get_by_type(relationship_types::SLIDE)
            .unwrap();
        assert_eq!(back.target.part(), Some(dest_slide));
    }

    fn with_table_style(mut pkg: Package, guid: &str) -> Package {
        let styles = pkg.add_part(Part::xml(
            PartKind::TableStyles,
            "ppt/tableStyles1.xml",
            XmlElement::new("a:tblStyleLst")
                .with_attr("def", guid)
                .with_child(XmlElement::new("a:tblStyle").with_attr("styleId", guid)),
        ));
        let root = pkg.root().unwrap();
        pkg.rels_mut(root)
            .unwrap()
            .add_internal(relationship_types::TABLE_STYLES, styles);

        let slide = pkg.slide_ids.entries()[0].part;
        let mut tree = pkg.checkout_tree(slide).unwrap();
        let mut style_ref = XmlElement::new("a:tableStyleId");
        style_ref.children.push(XmlNode::Text(guid.to_string()));
        tree.children.push(XmlNode::Element(style_ref));
        pkg.commit_tree(slide, tree).unwrap();
        pkg
    }

    #[test]
    fn test_shared_table_style_guid_collapses_to_one_entry() {
        let guid = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";
        let merged = merge(&[
            MergeSource::new(with_table_style(source_deck("Office", 1), guid)),
            MergeSource::new(with_table_style(source_deck("Office", 1), guid)),
        ])
        .unwrap();

        let styles: Vec<_> = merged.parts_of_kind(PartKind::TableStyles).collect();
        assert_eq!(styles.len(), 1);
        let (id, part) = styles[0];
        let tree = part.tree(id).unwrap();
        let entries: Vec<_> = tree
            .child_elements()
            .filter(|e| e.name == "a:tblStyle")
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attr("styleId"), Some(guid));
    }

    #[test]
    fn test_new_table_style_guid_appended_to_shared_part() {
        let merged = merge(&[
            MergeSource::new(with_table_style(
                source_deck("Office", 1),
                "{AAAAAAAA-0000-0000-0000-000000000001}",
            )),
            MergeSource::new(with_table_style(
                source_deck("Office", 1),
                "{BBBBBBBB-0000-0000-0000-000000000002}",
            )),
        ])
        .unwrap();

        let styles: Vec<_> = merged.parts_of_kind(PartKind::TableStyles).collect();
        assert_eq!(styles.len(), 1);
        let (id, part) = styles[0];
        let entries = part
            .tree(id)
            .unwrap()
            .child_elements()
            .filter(|e| e.name == "a:tblStyle")
            .count();
        assert_eq!(entries, 2);
    }

    fn with_embedded_font(mut pkg: Package, typeface: &str, payload: &[u8]) -> Package {
        let font = pkg.add_part(Part::binary(
            PartKind::Font,
            "ppt/fonts/font1.fntdata",
            "application/x-fontdata",
            payload.to_vec(),
        ));
        let root = pkg.root().unwrap();
        let rel_id = pkg
            .rels_mut(root)
            .unwrap()
            .add_internal(relationship_types::FONT, font);
        let mut tree = pkg.checkout_tree(root).unwrap();
        tree.children.push(XmlNode::Element(
            XmlElement::new("p:embeddedFontLst").with_child(
                XmlElement::new("p:embeddedFont")
                    .with_child(XmlElement::new("p:font").with_attr("typeface", typeface))
                    .with_child(XmlElement::new("p:regular").with_attr("r:id", rel_id)),
            ),
        ));
        pkg.commit_tree(root, tree).unwrap();
        pkg
    }

    #[test]
    fn test_embedded_fonts_deduplicated_by_typeface() {
        let merged = merge(&[
            MergeSource::new(with_embedded_font(source_deck("Office", 1), "Lato", b"font-a")),
            MergeSource::new(with_embedded_font(source_deck("Facet", 1), "Lato", b"font-b")),
        ])
        .unwrap();

        let root = merged.root().unwrap();
        let tree = merged.part(root).unwrap().tree(root).unwrap();
        let list = tree.child("p:embeddedFontLst").unwrap();
        assert_eq!(list.child_elements().count(), 1);

        // The surviving entry's payload reference resolves to copied bytes
        let rel_id = list
            .child("p:embeddedFont")
            .unwrap()
            .child("p:regular")
            .unwrap()
            .attr("r:id")
            .unwrap();
        let font = merged.resolve(root, rel_id).unwrap().target.part().unwrap();
        assert_eq!(merged.part(font).unwrap().kind, PartKind::Font);
        assert_eq!(merged.part(font).unwrap().bytes(font).unwrap(), b"font-a");
    }

    #[test]
    fn test_distinct_typefaces_both_kept() {
        let merged = merge(&[
            MergeSource::new(with_embedded_font(source_deck("Office", 1), "Lato", b"a")),
            MergeSource::new(with_embedded_font(source_deck("Facet", 1), "Inter", b"b")),
        ])
        .unwrap();

        let root = merged.root().unwrap();
        let tree = merged.part(root).unwrap().tree(root).unwrap();
        let list = tree.child("p:embeddedFontLst").unwrap();
        assert_eq!(list.child_elements().count(), 2);
        assert_eq!(merged.parts_of_kind(PartKind::Font).count(), 2);
    }

    #[test]
    fn test_external_font_reference_rewritten() {
        let mut src = source_deck("Office", 1);
        let root = src.root().unwrap();
        let rel_id = src
            .rels_mut(root)
            .unwrap()
            .add_external(relationship_types::FONT, "https://fonts.example/lato");
        let mut tree = src.checkout_tree(root).unwrap();
        tree.children.push(XmlNode::Element(
            XmlElement::new("p:embeddedFontLst").with_child(
                XmlElement::new("p:embeddedFont")
                    .with_child(XmlElement::new("p:font").with_attr("typeface", "Lato"))
                    .with_child(XmlElement::new("p:regular").with_attr("r:id", rel_id)),
            ),
        ));
        src.commit_tree(root, tree).unwrap();

        let merged = merge(&[MergeSource::new(src)]).unwrap();
        let dest_root = merged.root().unwrap();
        let dest_tree = merged.part(dest_root).unwrap().tree(dest_root).unwrap();
        let new_id = dest_tree
            .find("p:regular")
            .unwrap()
            .attr("r:id")
            .unwrap();
        let rel = merged.resolve(dest_root, new_id).unwrap();
        assert!(
            matches!(&rel.target, RelTarget::External(u) if u == "https://fonts.example/lato")
        );
    }

    #[test]
    fn test_root_children_in_canonical_order() {
        let merged = merge(&[MergeSource::new(source_deck("Office", 1))]).unwrap();
        let root = merged.root().unwrap();
        let tree = merged.part(root).unwrap().tree(root).unwrap();
        let ranks: Vec<usize> = tree
            .child_elements()
            .filter_map(|e| deck_store::canonical_rank(&e.name))
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
    }
}
