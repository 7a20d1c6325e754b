//! Master/theme reuse: decide whether a template group (master, its
//! layouts, its theme) must be copied or can be reused
//!
//! The reuse key is semantic, not structural: the theme name declared in
//! the master's theme part. Two template groups from different sources
//! with equal theme names are interchangeable.

use crate::error::{StructuralError, StructuralResult};
use crate::graft::{clone_xml_part, graft, GraftContext};
use crate::id_alloc::{IdAllocator, IdSpace};
use deck_model::{relationship_types, Package, PartId, XmlElement, XmlNode};

/// The theme name declared by a master's theme part
pub fn theme_name(pkg: &Package, master: PartId) -> StructuralResult<String> {
    let rel = pkg
        .rels(master)?
        .get_by_type(relationship_types::THEME)
        .ok_or_else(|| {
            StructuralError::ElementMissing(format!(
                "theme relationship on {}",
                master_path(pkg, master)
            ))
        })?;
    let theme = rel.target.part().ok_or_else(|| {
        StructuralError::ElementMissing(format!("internal theme target on {}", master_path(pkg, master)))
    })?;
    let tree = pkg.part(theme)?.tree(theme)?;
    Ok(tree.attr("name").unwrap_or("").to_string())
}

fn master_path(pkg: &Package, master: PartId) -> String {
    pkg.part(master)
        .map(|p| p.path.clone())
        .unwrap_or_else(|_| master.to_string())
}

/// The display name of a layout (`p:cSld name`), if declared
pub fn layout_name(pkg: &Package, layout: PartId) -> StructuralResult<Option<String>> {
    let tree = pkg.part(layout)?.tree(layout)?;
    Ok(tree
        .find("p:cSld")
        .and_then(|c| c.attr("name"))
        .map(str::to_string))
}

/// The layout a source slide is attached to
pub fn slide_layout(pkg: &Package, slide: PartId) -> StructuralResult<PartId> {
    pkg.rels(slide)?
        .get_by_type(relationship_types::SLIDE_LAYOUT)
        .and_then(|r| r.target.part())
        .ok_or_else(|| {
            StructuralError::ElementMissing(format!(
                "slide layout relationship on {}",
                master_path(pkg, slide)
            ))
        })
}

/// The master a layout belongs to
pub fn layout_master(pkg: &Package, layout: PartId) -> StructuralResult<PartId> {
    pkg.rels(layout)?
        .get_by_type(relationship_types::SLIDE_MASTER)
        .and_then(|r| r.target.part())
        .ok_or_else(|| {
            StructuralError::ElementMissing(format!(
                "slide master relationship on {}",
                master_path(pkg, layout)
            ))
        })
}

/// Layouts attached to a master, ordered by relationship id
pub fn master_layouts(pkg: &Package, master: PartId) -> StructuralResult<Vec<PartId>> {
    let mut rels: Vec<(u32, PartId)> = pkg
        .rels(master)?
        .get_all_by_type(relationship_types::SLIDE_LAYOUT)
        .iter()
        .filter_map(|r| {
            let part = r.target.part()?;
            let n = r.id.strip_prefix("rId").and_then(|s| s.parse::<u32>().ok())?;
            Some((n, part))
        })
        .collect();
    rels.sort_by_key(|(n, _)| *n);
    Ok(rels.into_iter().map(|(_, p)| p).collect())
}

/// Resolve or copy the template group for `src_master`.
///
/// A fresh deep copy is made when `share` is false or no destination
/// master carries the same theme name; otherwise the first matching
/// destination master is reused unchanged.
pub fn ensure_master(
    ctx: &mut GraftContext,
    alloc: &mut IdAllocator,
    src: &Package,
    src_master: PartId,
    share: bool,
) -> StructuralResult<PartId> {
    if share {
        let key = theme_name(src, src_master)?;
        let existing: Vec<PartId> = ctx.dest.master_ids.iter().map(|e| e.part).collect();
        for candidate in existing {
            if theme_name(ctx.dest, candidate)? == key {
                tracing::debug!("reusing master with theme {:?}", key);
                return Ok(candidate);
            }
        }
    }
    copy_master(ctx, alloc, src, src_master)
}

/// Deep-copy a template group: theme, master, every layout; renumber the
/// master-space entries from a contiguous block.
fn copy_master(
    ctx: &mut GraftContext,
    alloc: &mut IdAllocator,
    src: &Package,
    src_master: PartId,
) -> StructuralResult<PartId> {
    let src_theme = src
        .rels(src_master)?
        .get_by_type(relationship_types::THEME)
        .and_then(|r| r.target.part())
        .ok_or_else(|| {
            StructuralError::ElementMissing(format!(
                "theme relationship on {}",
                master_path(src, src_master)
            ))
        })?;

    let dest_theme = clone_xml_part(ctx.dest, src, src_theme)?;
    graft(ctx, src, src_theme, dest_theme)?;

    let dest_master = clone_xml_part(ctx.dest, src, src_master)?;
    graft(ctx, src, src_master, dest_master)?;
    ctx.dest
        .rels_mut(dest_master)?
        .add_internal(relationship_types::THEME, dest_theme);

    let src_layouts = master_layouts(src, src_master)?;

    // Master and layouts occupy the master space positionally
    let block = alloc.reserve_block(IdSpace::SlideMaster, 1 + src_layouts.len() as u32, ctx.dest);
    ctx.dest.master_ids.push(block, dest_master);

    let mut layout_list = XmlElement::new("p:sldLayoutIdLst");
    for (i, src_layout) in src_layouts.iter().enumerate() {
        let dest_layout = clone_xml_part(ctx.dest, src, *src_layout)?;
        graft(ctx, src, *src_layout, dest_layout)?;
        ctx.dest
            .rels_mut(dest_layout)?
            .add_internal(relationship_types::SLIDE_MASTER, dest_master);
        let rel_id = ctx
            .dest
            .rels_mut(dest_master)?
            .add_internal(relationship_types::SLIDE_LAYOUT, dest_layout);
        layout_list.children.push(XmlNode::Element(
            XmlElement::new("p:sldLayoutId")
                .with_attr("id", (block + 1 + i as u32).to_string())
                .with_attr("r:id", rel_id),
        ));
    }

    // Replace the source-era layout id list wholesale
    let mut tree = ctx.dest.checkout_tree(dest_master)?;
    let pos = tree
        .children
        .iter()
        .position(|c| matches!(c, XmlNode::Element(e) if e.name == "p:sldLayoutIdLst"));
    match pos {
        Some(i) => tree.children[i] = XmlNode::Element(layout_list),
        None => tree.children.push(XmlNode::Element(layout_list)),
    }
    ctx.dest.commit_tree(dest_master, tree)?;

    tracing::debug!(
        "copied master {} with {} layouts",
        master_path(ctx.dest, dest_master),
        src_layouts.len()
    );
    Ok(dest_master)
}

/// Pick the destination layout for a slide by layout-name match, falling
/// back to the master's first layout when nothing matches.
pub fn resolve_layout(
    dest: &Package,
    dest_master: PartId,
    wanted_name: Option<&str>,
) -> StructuralResult<PartId> {
    let layouts = master_layouts(dest, dest_master)?;
    let first = *layouts.first().ok_or_else(|| {
        StructuralError::ElementMissing(format!(
            "slide layouts on {}",
            master_path(dest, dest_master)
        ))
    })?;
    if let Some(wanted) = wanted_name {
        for layout in &layouts {
            if layout_name(dest, *layout)?.as_deref() == Some(wanted) {
                return Ok(*layout);
            }
        }
        tracing::warn!(
            "no layout named {:?} on {}; falling back to the first layout",
            wanted,
            master_path(dest, dest_master)
        );
    }
    Ok(first)
}
