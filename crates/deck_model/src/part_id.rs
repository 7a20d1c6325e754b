//! Arena indices for parts

use serde::{Deserialize, Serialize};

/// Index of a part in its package's arena.
///
/// Relationships store `PartId`s rather than owning references, so shared
/// targets (one media part referenced from many owners, one master shared
/// by many slides) never form ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartId(pub(crate) u32);

impl PartId {
    /// Create a part id from a raw arena index
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the raw arena index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
