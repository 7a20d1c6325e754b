//! Deck Model - package, part, and relationship model
//!
//! This crate holds the data model for presentation deck packages: a part
//! arena with typed kinds, per-part relationship collections, ordered id
//! lists, and the XML tree type used for XML-bodied parts.

mod error;
mod package;
mod part;
mod part_id;
mod relationship;
mod xml;

pub use error::{ModelError, ModelResult};
pub use package::{IdEntry, IdList, Package, PackageKind};
pub use part::{Part, PartBody, PartKind};
pub use part_id::PartId;
pub use relationship::{relationship_types, RelTarget, Relationship, Relationships};
pub use xml::{XmlElement, XmlNode};
