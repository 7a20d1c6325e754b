//! Part graph copying: clone a sub-graph of parts, rewriting every
//! reference attribute along the way
//!
//! The destination part starts as a clone of the source tree, still
//! carrying source-era relationship ids in its reference attributes. The
//! walk rewrites each registered attribute to a freshly created
//! relationship on the destination part, pulling referenced parts across
//! depth-first: binary leaves go through the dedup cache, XML parts are
//! cloned and grafted recursively.

use crate::error::{StructuralError, StructuralResult};
use crate::media_cache::MediaCache;
use crate::ref_table::{rule_for, MissingPolicy};
use deck_model::{relationship_types, Package, Part, PartId, RelTarget, XmlElement};

/// Mutable merge state threaded through one copy operation
pub struct GraftContext<'a> {
    pub dest: &'a mut Package,
    pub cache: &'a mut MediaCache,
}

impl<'a> GraftContext<'a> {
    pub fn new(dest: &'a mut Package, cache: &'a mut MediaCache) -> Self {
        Self { dest, cache }
    }
}

/// Clone a source XML part into the destination under a fresh path.
/// The new part has no relationships yet; its fresh-id counter is aligned
/// past the source part's ids so rewrites can never collide with ids
/// still present in the cloned tree.
pub fn clone_xml_part(
    dest: &mut Package,
    src: &Package,
    src_part: PartId,
) -> StructuralResult<PartId> {
    let part = src.part(src_part)?;
    let tree = part.tree(src_part)?.clone();
    let path = dest.next_path(part.kind);
    let mut cloned = Part::xml(part.kind, path, tree);
    cloned.content_type = part.content_type.clone();
    let id = dest.add_part(cloned);
    dest.rels_mut(id)?.align_after(src.rels(src_part)?);
    Ok(id)
}

/// Rewrite every reference attribute reachable in `dest_part`'s tree,
/// resolving values against `src_part`'s relationships and pulling
/// transitively referenced parts into the destination.
pub fn graft(
    ctx: &mut GraftContext,
    src: &Package,
    src_part: PartId,
    dest_part: PartId,
) -> StructuralResult<()> {
    let mut tree = ctx.dest.checkout_tree(dest_part)?;
    let walked = walk(&mut tree, ctx, src, src_part, dest_part);
    ctx.dest.commit_tree(dest_part, tree)?;
    walked?;
    copy_implicit_parts(ctx, src, src_part, dest_part)
}

fn walk(
    elem: &mut XmlElement,
    ctx: &mut GraftContext,
    src: &Package,
    src_part: PartId,
    dest_part: PartId,
) -> StructuralResult<()> {
    if let Some(rule) = rule_for(&elem.name) {
        for slot in rule.slots {
            let Some(value) = elem.attr(slot.attr).map(str::to_string) else {
                continue;
            };
            // Already a destination relationship: this subtree was
            // processed on an earlier pass through the same tree.
            if ctx.dest.rels(dest_part)?.contains(&value) {
                continue;
            }
            match src.rels(src_part)?.get(&value).cloned() {
                None => match slot.on_missing {
                    MissingPolicy::StripAttribute => {
                        tracing::warn!(
                            "stripping unresolvable {} on <{}> (was {})",
                            slot.attr,
                            elem.name,
                            value
                        );
                        elem.remove_attr(slot.attr);
                    }
                    MissingPolicy::Fail => {
                        return Err(StructuralError::RelationshipMissing {
                            owner_path: src.part(src_part)?.path.clone(),
                            rel_id: value,
                        });
                    }
                },
                Some(rel) => {
                    let new_id = copy_reference(ctx, src, &rel.target, &rel.rel_type, dest_part)?;
                    elem.set_attr(slot.attr, new_id);
                }
            }
        }
    }
    for child in elem.child_elements_mut() {
        walk(child, ctx, src, src_part, dest_part)?;
    }
    Ok(())
}

/// Pull one referenced target across and return the new relationship id
fn copy_reference(
    ctx: &mut GraftContext,
    src: &Package,
    target: &RelTarget,
    rel_type: &str,
    dest_part: PartId,
) -> StructuralResult<String> {
    match target {
        RelTarget::External(uri) => {
            ctx.cache
                .acquire_external(ctx.dest, dest_part, uri, rel_type)
        }
        RelTarget::Internal(src_target) => {
            let target_part = src.part(*src_target)?;
            if target_part.kind.is_binary() {
                ctx.cache
                    .acquire(ctx.dest, src, *src_target, dest_part, rel_type)
            } else {
                // Composite: clone, then graft its own tree depth-first so
                // transitively referenced sub-parts come across first.
                let new_part = clone_xml_part(ctx.dest, src, *src_target)?;
                graft(ctx, src, *src_target, new_part)?;
                Ok(ctx.dest.rels_mut(dest_part)?.add_internal(rel_type, new_part))
            }
        }
    }
}

/// VML drawing layers are attached to their owner positionally, not via a
/// reference attribute; copy them unconditionally alongside the owner.
fn copy_implicit_parts(
    ctx: &mut GraftContext,
    src: &Package,
    src_part: PartId,
    dest_part: PartId,
) -> StructuralResult<()> {
    let vml_rels: Vec<PartId> = src
        .rels(src_part)?
        .get_all_by_type(relationship_types::VML_DRAWING)
        .iter()
        .filter_map(|r| r.target.part())
        .collect();
    for src_vml in vml_rels {
        let new_part = clone_xml_part(ctx.dest, src, src_vml)?;
        graft(ctx, src, src_vml, new_part)?;
        ctx.dest
            .rels_mut(dest_part)?
            .add_internal(relationship_types::VML_DRAWING, new_part);
    }
    Ok(())
}
