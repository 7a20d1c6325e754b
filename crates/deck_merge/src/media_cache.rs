//! Content-addressed dedup cache for binary resources
//!
//! Two payloads are equivalent iff byte-identical. The cache keeps one
//! physical destination part per equivalence class, plus an owner-aware
//! map so the same owner never gets two relationships to one resource.
//! That second map is the single home of every "already processed" guard
//! in the copy logic.

use crate::error::StructuralResult;
use deck_model::{Package, Part, PartId};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Byte-equality class of a binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(digest.into())
    }
}

/// Dedup cache threaded through one whole multi-source merge
#[derive(Debug, Default)]
pub struct MediaCache {
    /// fingerprint -> the one physical destination part for that payload
    physical: HashMap<Fingerprint, PartId>,
    /// (destination owner, physical part) -> existing relationship id
    owner_edges: HashMap<(PartId, PartId), String>,
    /// (destination owner, external URI) -> existing relationship id
    external_edges: HashMap<(PartId, String), String>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a source binary part to `dest_owner`, copying bytes only on
    /// the first sighting of this payload anywhere in the merge.
    ///
    /// Idempotent per owner: walking the same source part twice (once via
    /// the slide, again via its comments) returns the same id.
    pub fn acquire(
        &mut self,
        dest: &mut Package,
        src: &Package,
        src_part: PartId,
        dest_owner: PartId,
        rel_type: &str,
    ) -> StructuralResult<String> {
        let part = src.part(src_part)?;
        let data = part.bytes(src_part)?;
        let fingerprint = Fingerprint::of(data);

        let physical = match self.physical.get(&fingerprint) {
            Some(&existing) => existing,
            None => {
                let extension = part.path.rsplit('.').next().unwrap_or("bin").to_string();
                let path = dest.next_path_with_extension(part.kind, &extension);
                let content_type = part
                    .effective_content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let new = dest.add_part(Part::binary(part.kind, path, content_type, data.to_vec()));
                tracing::debug!("copied binary payload into {}", dest.part(new)?.path);
                self.physical.insert(fingerprint, new);
                new
            }
        };

        if let Some(id) = self.owner_edges.get(&(dest_owner, physical)) {
            return Ok(id.clone());
        }
        let id = dest.rels_mut(dest_owner)?.add_internal(rel_type, physical);
        self.owner_edges.insert((dest_owner, physical), id.clone());
        Ok(id)
    }

    /// Re-point an external reference at the same URI with a fresh id,
    /// deduplicated per `(owner, uri)` pair. No byte comparison.
    pub fn acquire_external(
        &mut self,
        dest: &mut Package,
        dest_owner: PartId,
        uri: &str,
        rel_type: &str,
    ) -> StructuralResult<String> {
        let key = (dest_owner, uri.to_string());
        if let Some(id) = self.external_edges.get(&key) {
            return Ok(id.clone());
        }
        let id = dest.rels_mut(dest_owner)?.add_external(rel_type, uri);
        self.external_edges.insert(key, id.clone());
        Ok(id)
    }

    /// The physical part currently registered for a payload, if any
    pub fn physical_for(&self, data: &[u8]) -> Option<PartId> {
        self.physical.get(&Fingerprint::of(data)).copied()
    }
}
