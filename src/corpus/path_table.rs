//! Precomputed classification of every module, package and directory path.
//!
//! The table trades memory for a single map lookup per redirect decision. It is
//! built from the same latest-version view the live lookups use, so both
//! strategies agree for any corpus state. The table can be cached on disk with
//! postcard, keyed by an xxh3 fingerprint of the snapshot it was built from.

use super::is_stdlib_module;
use crate::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// What a path names. Ordered by precedence: a module root that is also a
/// package is classified as a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathKind {
    Directory,
    Package,
    Module,
}

/// One classified path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    pub path: String,
    /// The module that owns the path.
    pub module_path: String,
    pub kind: PathKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    module_path: String,
    kind: PathKind,
}

/// On-disk cache layout: the table plus the snapshot it belongs to.
#[derive(Serialize, Deserialize)]
struct CachedTable {
    source_fingerprint: u64,
    table: PathTable,
}

/// Fingerprint of raw snapshot bytes, used to key the path table cache.
pub fn snapshot_fingerprint(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Map from path to its classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTable {
    entries: BTreeMap<String, Entry>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module root.
    pub fn insert_module(&mut self, module_path: &str) {
        self.upsert(module_path, module_path, PathKind::Module);
    }

    /// Record a package and every directory between it and its module root.
    pub fn insert_package(&mut self, module_path: &str, package_path: &str) {
        self.upsert(package_path, module_path, PathKind::Package);
        for dir in parent_dirs(package_path) {
            if directory_in_module(dir, module_path) {
                self.upsert(dir, module_path, PathKind::Directory);
            }
        }
    }

    /// Look up a path.
    pub fn get(&self, path: &str) -> Option<PathInfo> {
        self.entries.get(path).map(|entry| PathInfo {
            path: path.to_string(),
            module_path: entry.module_path.clone(),
            kind: entry.kind,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of paths of the given kind.
    pub fn count(&self, kind: PathKind) -> usize {
        self.entries.values().filter(|e| e.kind == kind).count()
    }

    /// Keeps the higher-precedence kind; between equal kinds the longer
    /// (more specific) module path wins.
    fn upsert(&mut self, path: &str, module_path: &str, kind: PathKind) {
        match self.entries.get_mut(path) {
            Some(existing) => {
                let replace = kind > existing.kind
                    || (kind == existing.kind && module_path.len() > existing.module_path.len());
                if replace {
                    existing.kind = kind;
                    existing.module_path = module_path.to_string();
                }
            }
            None => {
                self.entries.insert(
                    path.to_string(),
                    Entry {
                        module_path: module_path.to_string(),
                        kind,
                    },
                );
            }
        }
    }

    /// Write the table to `path` for the snapshot with `source_fingerprint`,
    /// replacing any previous cache file.
    pub fn store(&self, path: &Path, source_fingerprint: u64) -> Result<()> {
        let cached = CachedTable {
            source_fingerprint,
            table: self.clone(),
        };
        let bytes = postcard::to_stdvec(&cached).context("Failed to encode path table")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write path table to {}", path.display()))?;
        tracing::debug!(
            "Cached path table ({} paths, snapshot {:016x}) to {}",
            self.len(),
            source_fingerprint,
            path.display()
        );
        Ok(())
    }

    /// Load a cached table built from the snapshot with `source_fingerprint`.
    ///
    /// Returns `None` for a missing, undecodable or mismatched cache. A cache
    /// built from another snapshot is deleted so the caller stores a fresh one.
    pub fn load(path: &Path, source_fingerprint: u64) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        let cached = match postcard::from_bytes::<CachedTable>(&bytes) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(
                    "Failed to decode cached path table at {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        if cached.source_fingerprint != source_fingerprint {
            tracing::warn!(
                "Path table cache belongs to another snapshot ({:016x} != {:016x}), will rebuild (file: {})",
                cached.source_fingerprint,
                source_fingerprint,
                path.display()
            );
            let _ = std::fs::remove_file(path);
            return None;
        }

        tracing::debug!("Using cached path table ({} paths)", cached.table.len());
        Some(cached.table)
    }
}

/// Proper prefixes of `path` at `/` boundaries, longest first.
pub(crate) fn parent_dirs(path: &str) -> impl Iterator<Item = &str> {
    path.rmatch_indices('/').map(move |(i, _)| &path[..i]).filter(|dir| !dir.is_empty())
}

/// True if `dir` is a directory inside `module_path` rather than above or at its root.
pub(crate) fn directory_in_module(dir: &str, module_path: &str) -> bool {
    if is_stdlib_module(module_path) {
        return true;
    }
    dir.len() > module_path.len()
        && dir.starts_with(module_path)
        && dir.as_bytes()[module_path.len()] == b'/'
}
