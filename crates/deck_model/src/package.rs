//! The package under construction: part arena, relationships, id lists

use crate::error::{ModelError, ModelResult};
use crate::part::{Part, PartBody, PartKind};
use crate::part_id::PartId;
use crate::relationship::{Relationship, Relationships};
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// One entry of an ordered id list: numeric id plus the part it names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdEntry {
    pub num_id: u32,
    pub part: PartId,
}

/// An ordered id list doubling as a sequencing and uniqueness domain
#[derive(Debug, Clone, Default)]
pub struct IdList {
    entries: Vec<IdEntry>,
}

impl IdList {
    pub fn push(&mut self, num_id: u32, part: PartId) {
        self.entries.push(IdEntry { num_id, part });
    }

    pub fn entries(&self) -> &[IdEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest numeric id currently in the list
    pub fn max_id(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.num_id).max()
    }

    pub fn contains_part(&self, part: PartId) -> bool {
        self.entries.iter().any(|e| e.part == part)
    }
}

/// The kind of container a package represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageKind {
    Presentation,
}

/// A whole deck package: parts, their relationships, and ordered lists.
///
/// Parts live in an arena indexed by [`PartId`]; each slot has a parallel
/// [`Relationships`] collection. Mutation during a merge targets only the
/// destination package; sources are read-only.
#[derive(Debug, Clone)]
pub struct Package {
    pub kind: PackageKind,
    parts: Vec<Part>,
    rels: Vec<Relationships>,
    root: Option<PartId>,
    /// Ordered slide ids (the content-item order)
    pub slide_ids: IdList,
    /// Ordered slide-master ids; layout entries share this numbering space
    pub master_ids: IdList,
}

impl Package {
    pub fn new(kind: PackageKind) -> Self {
        Self {
            kind,
            parts: Vec::new(),
            rels: Vec::new(),
            root: None,
            slide_ids: IdList::default(),
            master_ids: IdList::default(),
        }
    }

    /// Add a part to the arena and return its id
    pub fn add_part(&mut self, part: Part) -> PartId {
        let id = PartId::from_index(self.parts.len());
        self.parts.push(part);
        self.rels.push(Relationships::new());
        id
    }

    pub fn part(&self, id: PartId) -> ModelResult<&Part> {
        self.parts.get(id.index()).ok_or(ModelError::PartNotFound(id))
    }

    pub fn part_mut(&mut self, id: PartId) -> ModelResult<&mut Part> {
        self.parts
            .get_mut(id.index())
            .ok_or(ModelError::PartNotFound(id))
    }

    pub fn rels(&self, id: PartId) -> ModelResult<&Relationships> {
        self.rels.get(id.index()).ok_or(ModelError::PartNotFound(id))
    }

    pub fn rels_mut(&mut self, id: PartId) -> ModelResult<&mut Relationships> {
        self.rels
            .get_mut(id.index())
            .ok_or(ModelError::PartNotFound(id))
    }

    /// Resolve a local relationship id against its owner part
    pub fn resolve(&self, owner: PartId, rel_id: &str) -> ModelResult<&Relationship> {
        self.rels(owner)?
            .get(rel_id)
            .ok_or_else(|| ModelError::RelationshipNotFound {
                owner,
                rel_id: rel_id.to_string(),
            })
    }

    pub fn set_root(&mut self, id: PartId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<PartId> {
        self.root
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// All part ids in arena order
    pub fn part_ids(&self) -> impl Iterator<Item = PartId> {
        (0..self.parts.len()).map(PartId::from_index)
    }

    /// All parts of the given kind
    pub fn parts_of_kind(&self, kind: PartKind) -> impl Iterator<Item = (PartId, &Part)> {
        self.parts
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.kind == kind)
            .map(|(i, p)| (PartId::from_index(i), p))
    }

    /// First part of the given kind, if any
    pub fn find_part_of_kind(&self, kind: PartKind) -> Option<PartId> {
        self.parts_of_kind(kind).next().map(|(id, _)| id)
    }

    /// Check out a part's XML tree for rewriting (copy-on-write checkout).
    /// The body must be committed back with [`Package::commit_tree`].
    pub fn checkout_tree(&mut self, id: PartId) -> ModelResult<XmlElement> {
        let part = self.part_mut(id)?;
        match std::mem::replace(&mut part.body, PartBody::CheckedOut) {
            PartBody::Xml(tree) => Ok(tree),
            other => {
                part.body = other;
                match &part.body {
                    PartBody::Binary(_) => Err(ModelError::NotXml(id)),
                    _ => Err(ModelError::BodyCheckedOut(id)),
                }
            }
        }
    }

    /// Commit a previously checked-out tree back into its part
    pub fn commit_tree(&mut self, id: PartId, tree: XmlElement) -> ModelResult<()> {
        let part = self.part_mut(id)?;
        part.body = PartBody::Xml(tree);
        Ok(())
    }

    /// Existing paths in the package, used for collision-free naming
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.path.as_str())
    }

    /// Allocate a fresh, collision-free path for a new part of this kind
    pub fn next_path(&self, kind: PartKind) -> String {
        self.next_path_with_extension(kind, kind.path_family().2)
    }

    /// Same as [`Package::next_path`] but with an explicit file extension
    /// (media parts keep the extension of their payload)
    pub fn next_path_with_extension(&self, kind: PartKind, extension: &str) -> String {
        let (dir, base, _) = kind.path_family();
        let mut n = 1;
        loop {
            let candidate = format!("{}/{}{}.{}", dir, base, n, extension);
            if !self.paths().any(|p| p == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::Part;

    fn slide_part(n: u32) -> Part {
        Part::xml(
            PartKind::Slide,
            format!("ppt/slides/slide{}.xml", n),
            XmlElement::new("p:sld"),
        )
    }

    #[test]
    fn test_arena_add_and_get() {
        let mut pkg = Package::new(PackageKind::Presentation);
        let a = pkg.add_part(slide_part(1));
        let b = pkg.add_part(slide_part(2));
        assert_ne!(a, b);
        assert_eq!(pkg.part(a).unwrap().path, "ppt/slides/slide1.xml");
        assert_eq!(pkg.part(b).unwrap().path, "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_resolve_missing_relationship() {
        let mut pkg = Package::new(PackageKind::Presentation);
        let a = pkg.add_part(slide_part(1));
        let err = pkg.resolve(a, "rId1").unwrap_err();
        assert!(matches!(err, ModelError::RelationshipNotFound { .. }));
    }

    #[test]
    fn test_checkout_commit_roundtrip() {
        let mut pkg = Package::new(PackageKind::Presentation);
        let a = pkg.add_part(slide_part(1));

        let mut tree = pkg.checkout_tree(a).unwrap();
        tree.set_attr("dirty", "1");

        // Body is unavailable while checked out
        assert!(pkg.part(a).unwrap().tree(a).is_err());

        pkg.commit_tree(a, tree).unwrap();
        assert_eq!(pkg.part(a).unwrap().tree(a).unwrap().attr("dirty"), Some("1"));
    }

    #[test]
    fn test_next_path_skips_taken() {
        let mut pkg = Package::new(PackageKind::Presentation);
        pkg.add_part(slide_part(1));
        assert_eq!(pkg.next_path(PartKind::Slide), "ppt/slides/slide2.xml");
        assert_eq!(
            pkg.next_path_with_extension(PartKind::Media, "png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_id_list_max() {
        let mut list = IdList::default();
        assert_eq!(list.max_id(), None);
        list.push(256, PartId::from_index(0));
        list.push(310, PartId::from_index(1));
        assert_eq!(list.max_id(), Some(310));
        assert_eq!(list.len(), 2);
    }
}
