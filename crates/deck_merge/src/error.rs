//! Two-tier error taxonomy for the merge core
//!
//! [`StructuralError`] is the internal tier: an invariant the merge core
//! itself must guarantee was violated. [`MergeError`] is the user-facing
//! tier carrying the index of the source package being processed when the
//! failure occurred.

use thiserror::Error;

/// Internal structural error: a programming or malformed-input defect,
/// never retried.
#[derive(Debug, Error)]
pub enum StructuralError {
    /// A relationship claimed by a reference attribute does not exist on
    /// the source part
    #[error("relationship {rel_id} not found on part {owner_path}")]
    RelationshipMissing { owner_path: String, rel_id: String },

    /// A relationship resolved to a part that cannot be located
    #[error("part missing: {0}")]
    PartMissing(String),

    /// A required structural element is absent from a part's tree
    #[error("required element missing: {0}")]
    ElementMissing(String),

    /// Package model inconsistency
    #[error("model error: {0}")]
    Model(#[from] deck_model::ModelError),

    /// Container I/O failure
    #[error("store error: {0}")]
    Store(#[from] deck_store::StoreError),
}

/// Result type used inside the merge core
pub type StructuralResult<T> = std::result::Result<T, StructuralError>;

/// User-facing merge error: the structural failure plus the 0-based index
/// of the offending source, so callers can report "source #N is malformed".
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("source #{source_index}: {source}")]
    Source {
        source_index: usize,
        source: StructuralError,
    },

    /// Failure outside any single source's pass (finalization, save)
    #[error("merge finalization failed: {0}")]
    Finalize(#[from] StructuralError),
}

impl MergeError {
    pub fn at(source_index: usize, source: StructuralError) -> Self {
        MergeError::Source {
            source_index,
            source,
        }
    }

    /// Index of the offending source, when the failure was tied to one
    pub fn source_index(&self) -> Option<usize> {
        match self {
            MergeError::Source { source_index, .. } => Some(*source_index),
            MergeError::Finalize(_) => None,
        }
    }
}

/// Result type for the user-facing merge surface
pub type MergeResult<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_index_in_message() {
        let err = MergeError::at(
            2,
            StructuralError::RelationshipMissing {
                owner_path: "ppt/slides/slide1.xml".into(),
                rel_id: "rId4".into(),
            },
        );
        assert_eq!(err.source_index(), Some(2));
        assert!(err.to_string().starts_with("source #2"));
    }
}
