//! Deck Store - container I/O for deck packages
//!
//! Opens and saves the ZIP container, maps content types to part kinds,
//! parses and regenerates `.rels` files, and keeps the presentation root
//! part's id lists in sync with the in-memory package.

mod content_types;
mod error;
mod paths;
mod presentation;
mod reader;
mod rels_io;
mod writer;

pub use content_types::ContentTypes;
pub use error::{StoreError, StoreResult};
pub use paths::{parent_dir, relative_target, resolve_target};
pub use presentation::{canonical_rank, create_empty, normalize_root_order, sync_id_lists};
pub use reader::open_package;
pub use rels_io::{parse_rels, rels_path_for, RawRel};
pub use writer::save_package;
