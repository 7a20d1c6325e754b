//! Error types for the package model

use crate::part_id::PartId;
use thiserror::Error;

/// Errors raised by package/part/relationship accessors
#[derive(Debug, Error)]
pub enum ModelError {
    /// A part index does not exist in the package arena
    #[error("Part not found: {0}")]
    PartNotFound(PartId),

    /// A relationship id does not resolve on its owner part
    #[error("Relationship {rel_id} not found on part {owner}")]
    RelationshipNotFound { owner: PartId, rel_id: String },

    /// An XML tree was requested from a binary part
    #[error("Part {0} has a binary body, not an XML tree")]
    NotXml(PartId),

    /// A byte payload was requested from an XML part
    #[error("Part {0} has an XML body, not a byte payload")]
    NotBinary(PartId),

    /// A tree was checked out and never committed back
    #[error("Part {0} has no body (tree checked out and not committed)")]
    BodyCheckedOut(PartId),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),
}

impl From<quick_xml::Error> for ModelError {
    fn from(err: quick_xml::Error) -> Self {
        ModelError::XmlParse(err.to_string())
    }
}

/// Result type for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;
