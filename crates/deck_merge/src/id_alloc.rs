//! Scoped monotonic id allocation
//!
//! Each numbering space is seeded on first use by scanning the
//! destination package, then incremented in memory for the rest of the
//! merge. Ids are never recycled; a failed partial copy does not return
//! its ids to the pool.

use deck_model::{Package, PartKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An independent id domain requiring internal uniqueness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSpace {
    /// Slide ids in `p:sldIdLst`
    Slide,
    /// Master ids in `p:sldMasterIdLst`; layout entries share this space
    SlideMaster,
    /// Comment author ids in the comment-authors part
    CommentAuthor,
}

impl IdSpace {
    /// Base value when the destination has no ids in this space yet.
    /// Bases are space-specific; callers must not assume a shared counter.
    pub fn base(&self) -> u32 {
        match self {
            IdSpace::Slide => 256,
            IdSpace::SlideMaster => 0x8000_0000,
            IdSpace::CommentAuthor => 1,
        }
    }
}

/// Monotonic counters over the numbering spaces of one destination package
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: HashMap<IdSpace, u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free id in the given space
    pub fn next(&mut self, space: IdSpace, pkg: &Package) -> u32 {
        self.reserve_block(space, 1, pkg)
    }

    /// Reserve `n` contiguous ids and return the first. Used for a master
    /// and its layouts, which occupy the master space positionally.
    pub fn reserve_block(&mut self, space: IdSpace, n: u32, pkg: &Package) -> u32 {
        let counter = self
            .counters
            .entry(space)
            .or_insert_with(|| seed(space, pkg));
        let start = *counter;
        *counter += n;
        start
    }
}

/// First-use seed: `max + 1` over the destination's current ids in the
/// space, or the space base when none exist.
fn seed(space: IdSpace, pkg: &Package) -> u32 {
    let max = match space {
        IdSpace::Slide => pkg.slide_ids.max_id(),
        IdSpace::SlideMaster => {
            let list_max = pkg.master_ids.max_id();
            let layout_max = pkg
                .parts_of_kind(PartKind::SlideMaster)
                .filter_map(|(id, part)| part.tree(id).ok())
                .filter_map(|tree| tree.child("p:sldLayoutIdLst"))
                .flat_map(|lst| lst.child_elements())
                .filter_map(|e| e.attr("id"))
                .filter_map(|v| v.parse::<u32>().ok())
                .max();
            list_max.max(layout_max)
        }
        IdSpace::CommentAuthor => pkg
            .parts_of_kind(PartKind::CommentAuthors)
            .filter_map(|(id, part)| part.tree(id).ok())
            .flat_map(|tree| tree.child_elements())
            .filter_map(|e| e.attr("id"))
            .filter_map(|v| v.parse::<u32>().ok())
            .max(),
    };
    match max {
        Some(m) => m + 1,
        None => space.base(),
    }
}
