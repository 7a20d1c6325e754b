//! Relationships: owner-scoped edges between parts
//!
//! Every part owns its own relationship namespace. The same local id
//! ("rId1") may appear under different owners meaning different things,
//! so relationships are always resolved through their owner.

use crate::part_id::PartId;
use std::collections::HashMap;

/// Well-known OOXML relationship type URIs
pub mod relationship_types {
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const HANDOUT_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/handoutMaster";
    pub const COMMENTS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const COMMENT_AUTHORS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/commentAuthors";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const AUDIO: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio";
    pub const VIDEO: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/video";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const CHART_DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartUserShapes";
    pub const DIAGRAM_DATA: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramData";
    pub const DIAGRAM_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramLayout";
    pub const DIAGRAM_STYLE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramQuickStyle";
    pub const DIAGRAM_COLORS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramColors";
    pub const OLE_OBJECT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject";
    pub const PACKAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
    pub const FONT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/font";
    pub const VML_DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing";
    pub const CONTROL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/control";
    pub const CUSTOM_XML: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml";
    pub const PRESENTATION: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
}

/// Where a relationship points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    /// Another part in the same package
    Internal(PartId),
    /// An external URI (hyperlink, linked media)
    External(String),
}

impl RelTarget {
    /// The internal part id, if this is an internal target
    pub fn part(&self) -> Option<PartId> {
        match self {
            RelTarget::Internal(id) => Some(*id),
            RelTarget::External(_) => None,
        }
    }
}

/// A single directed edge owned by one part
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Local id, unique within the owner's namespace (e.g. "rId3")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    pub target: RelTarget,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        matches!(self.target, RelTarget::External(_))
    }
}

/// All relationships owned by one part
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    relationships: HashMap<String, Relationship>,
    /// Counter for generating new local ids
    next_id: u32,
}

impl Relationships {
    pub fn new() -> Self {
        Self {
            relationships: HashMap::new(),
            next_id: 1,
        }
    }

    /// Add a relationship to an internal part and return its fresh id
    pub fn add_internal(&mut self, rel_type: &str, target: PartId) -> String {
        self.add(rel_type, RelTarget::Internal(target))
    }

    /// Add a relationship to an external URI and return its fresh id
    pub fn add_external(&mut self, rel_type: &str, uri: &str) -> String {
        self.add(rel_type, RelTarget::External(uri.to_string()))
    }

    fn add(&mut self, rel_type: &str, target: RelTarget) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id += 1;
        self.relationships.insert(
            id.clone(),
            Relationship {
                id: id.clone(),
                rel_type: rel_type.to_string(),
                target,
            },
        );
        id
    }

    /// Advance this collection's fresh-id counter past every numeric id
    /// in `other`. Used when a destination part is cloned from a source
    /// part: source-era id strings left in the cloned tree must never
    /// collide with freshly generated ids.
    pub fn align_after(&mut self, other: &Relationships) {
        for rel in other.relationships.values() {
            if let Some(num) = rel.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
                self.next_id = self.next_id.max(num + 1);
            }
        }
    }

    /// Insert a relationship under a caller-chosen id, bumping the counter
    /// past it so later fresh ids cannot collide
    pub fn insert_with_id(&mut self, id: &str, rel_type: &str, target: RelTarget) {
        if let Some(num) = id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
            self.next_id = self.next_id.max(num + 1);
        }
        self.relationships.insert(
            id.to_string(),
            Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.relationships.contains_key(id)
    }

    /// First relationship of the given type, if any
    pub fn get_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.relationships.values().find(|r| r.rel_type == rel_type)
    }

    /// All relationships of the given type
    pub fn get_all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Existing edge from this owner to the given internal part, if any
    pub fn find_internal(&self, target: PartId) -> Option<&Relationship> {
        self.relationships
            .values()
            .find(|r| r.target == RelTarget::Internal(target))
    }

    /// Existing edge from this owner to the given external URI, if any
    pub fn find_external(&self, uri: &str) -> Option<&Relationship> {
        self.relationships
            .values()
            .find(|r| matches!(&r.target, RelTarget::External(u) if u == uri))
    }

    pub fn all(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}
