//! Merge engine for presentation deck packages
//!
//! Combines slides from multiple source decks into one destination
//! package while keeping the part/relationship graph closed: every
//! reference in the output resolves, binary payloads are deduplicated by
//! content, and numeric ids stay unique within their numbering spaces.

pub mod error;
pub mod graft;
pub mod id_alloc;
pub mod masters;
pub mod media_cache;
pub mod orchestrator;
pub mod ref_table;

pub use error::{MergeError, MergeResult, StructuralError, StructuralResult};
pub use graft::{clone_xml_part, graft, GraftContext};
pub use id_alloc::{IdAllocator, IdSpace};
pub use masters::{ensure_master, resolve_layout, theme_name};
pub use media_cache::{Fingerprint, MediaCache};
pub use orchestrator::{merge, merge_to_bytes, MergeSource, SourceOptions};
