//! In-memory corpus backing.
//!
//! Holds every published module version, derives the latest-version view on
//! insert, and answers both live lookups (range scans over sorted package paths)
//! and path-table lookups from that view.

use super::path_table::{PathInfo, PathTable, directory_in_module, snapshot_fingerprint};
use super::tokenize::{TermWeights, english_stemmer, tokenize_and_stem};
use super::{
    CorpusStore, ModuleRecord, PackageMatch, PackageRecord, SearchResponse, is_stdlib_module,
};
use crate::error::{CorpusError, Result};
use ahash::AHashMap;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Relative error reported for counts above the approximation threshold.
const ESTIMATE_SIGMA: f64 = 0.1;

const NAME_WEIGHT: f64 = 2.0;
const PATH_WEIGHT: f64 = 1.0;
const SYNOPSIS_WEIGHT: f64 = 1.0;
const README_WEIGHT: f64 = 0.25;

/// Serialized form of a corpus: module versions plus reverse-dependency counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub modules: Vec<ModuleRecord>,
    /// Package path to number of importing packages.
    #[serde(default)]
    pub imported_by: BTreeMap<String, u64>,
}

/// A package of some module's latest version, ready for search.
#[derive(Debug)]
struct IndexedPackage {
    module: Arc<ModuleRecord>,
    index: usize,
    terms: TermWeights,
}

impl IndexedPackage {
    fn record(&self) -> &PackageRecord {
        &self.module.packages[self.index]
    }
}

/// Corpus held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCorpus {
    /// All published versions, keyed by module path.
    versions: AHashMap<String, Vec<Arc<ModuleRecord>>>,
    /// Latest version of each module.
    latest: BTreeMap<String, Arc<ModuleRecord>>,
    /// Package path to the owning latest module. Sorted for prefix scans.
    packages: BTreeMap<String, IndexedPackage>,
    imported_by: AHashMap<String, u64>,
    path_table: PathTable,
    approximate_above: Option<usize>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report match counts above `threshold` as estimates with 10% relative error.
    pub fn with_approximate_above(mut self, threshold: Option<usize>) -> Self {
        self.approximate_above = threshold;
        self
    }

    /// Build a corpus from a snapshot.
    pub fn from_snapshot(snapshot: CorpusSnapshot) -> std::result::Result<Self, CorpusError> {
        Self::from_snapshot_with(snapshot, None)
    }

    /// Publish every version in `snapshot` and index once. A `path_table`
    /// must have been built from this same snapshot.
    fn from_snapshot_with(
        snapshot: CorpusSnapshot,
        path_table: Option<PathTable>,
    ) -> std::result::Result<Self, CorpusError> {
        let mut corpus = Self::new();
        for module in snapshot.modules {
            corpus.publish(module)?;
        }
        for (path, count) in snapshot.imported_by {
            corpus.set_imported_by(&path, count);
        }

        corpus.index_packages();
        corpus.path_table = match path_table {
            Some(table) => table,
            None => corpus.build_path_table(),
        };
        Ok(corpus)
    }

    /// Load a JSON snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let (snapshot, _) = read_snapshot(path)?;
        let module_count = snapshot.modules.len();
        let corpus = Self::from_snapshot(snapshot)
            .with_context(|| format!("Invalid corpus snapshot at {}", path.display()))?;
        corpus.log_loaded(module_count, path);
        Ok(corpus)
    }

    /// Load a JSON snapshot, reusing the path table cached at `cache` when it
    /// was built from the same snapshot bytes. Otherwise the table is rebuilt
    /// and the cache rewritten.
    pub fn load_with_path_table(path: &Path, cache: &Path) -> Result<Self> {
        let (snapshot, fingerprint) = read_snapshot(path)?;
        let module_count = snapshot.modules.len();
        let cached = PathTable::load(cache, fingerprint);
        let from_cache = cached.is_some();

        let corpus = Self::from_snapshot_with(snapshot, cached)
            .with_context(|| format!("Invalid corpus snapshot at {}", path.display()))?;
        if !from_cache {
            corpus
                .path_table
                .store(cache, fingerprint)
                .context("Failed to cache path table")?;
        }
        corpus.log_loaded(module_count, path);
        Ok(corpus)
    }

    fn log_loaded(&self, module_count: usize, path: &Path) {
        tracing::info!(
            "Loaded {} module versions ({} packages, {} paths) from {}",
            module_count,
            self.packages.len(),
            self.path_table.len(),
            path.display()
        );
    }

    /// Publish a module version.
    ///
    /// Versions are immutable: re-inserting an existing `(path, version)` fails.
    pub fn insert_module(&mut self, module: ModuleRecord) -> std::result::Result<(), CorpusError> {
        self.publish(module)?;
        self.reindex();
        Ok(())
    }

    /// Record a version and recompute the latest one for its path, without
    /// touching the indexes.
    fn publish(&mut self, module: ModuleRecord) -> std::result::Result<(), CorpusError> {
        validate_module(&module)?;

        let versions = self.versions.entry(module.path.clone()).or_default();
        if versions.iter().any(|v| v.version == module.version) {
            return Err(CorpusError::Conflict(format!(
                "{}@{} is already published",
                module.path, module.version
            )));
        }

        tracing::debug!(
            "Inserting {}@{} ({} packages)",
            module.path,
            module.version,
            module.packages.len()
        );
        versions.push(Arc::new(module));

        if let Some(latest) = versions.iter().max_by(|a, b| {
            a.commit_time
                .cmp(&b.commit_time)
                .then_with(|| a.version.cmp(&b.version))
        }) {
            self.latest.insert(latest.path.clone(), latest.clone());
        }
        Ok(())
    }

    /// Record how many packages import `package_path`.
    pub fn set_imported_by(&mut self, package_path: &str, count: u64) {
        self.imported_by.insert(package_path.to_string(), count);
    }

    pub fn path_table(&self) -> &PathTable {
        &self.path_table
    }

    pub fn module_count(&self) -> usize {
        self.latest.len()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Rebuild the package index and path table from the latest versions.
    fn reindex(&mut self) {
        self.index_packages();
        self.path_table = self.build_path_table();
    }

    /// When two modules claim the same package path, the longer (nested)
    /// module path owns it.
    fn index_packages(&mut self) {
        let stemmer = english_stemmer();
        let mut packages: BTreeMap<String, IndexedPackage> = BTreeMap::new();

        for module in self.latest.values() {
            for (index, package) in module.packages.iter().enumerate() {
                let claimed_by_nested = packages
                    .get(&package.path)
                    .is_some_and(|existing| existing.module.path.len() > module.path.len());
                if claimed_by_nested {
                    continue;
                }

                let mut terms = TermWeights::default();
                terms.add_text(&package.name, NAME_WEIGHT, &stemmer);
                terms.add_text(&package.path, PATH_WEIGHT, &stemmer);
                if !is_stdlib_module(&module.path) {
                    terms.add_text(&module.path, PATH_WEIGHT, &stemmer);
                }
                terms.add_text(&package.synopsis, SYNOPSIS_WEIGHT, &stemmer);
                terms.add_text(&module.readme, README_WEIGHT, &stemmer);

                packages.insert(
                    package.path.clone(),
                    IndexedPackage {
                        module: module.clone(),
                        index,
                        terms,
                    },
                );
            }
        }

        self.packages = packages;
    }

    fn build_path_table(&self) -> PathTable {
        let mut table = PathTable::new();
        for module_path in self.latest.keys() {
            table.insert_module(module_path);
        }
        for (path, package) in &self.packages {
            table.insert_package(&package.module.path, path);
        }
        table
    }

    fn imported_by(&self, package_path: &str) -> Option<u64> {
        self.imported_by.get(package_path).copied()
    }
}

/// Read and parse a snapshot, returning it with the fingerprint of its bytes.
fn read_snapshot(path: &Path) -> Result<(CorpusSnapshot, u64)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read corpus snapshot at {}", path.display()))?;
    let snapshot: CorpusSnapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse corpus snapshot at {}", path.display()))?;
    Ok((snapshot, snapshot_fingerprint(&bytes)))
}

fn validate_module(module: &ModuleRecord) -> std::result::Result<(), CorpusError> {
    if module.path.is_empty() || module.version.is_empty() {
        return Err(CorpusError::Invalid(
            "module path and version must be non-empty".to_string(),
        ));
    }

    let mut seen = ahash::AHashSet::with_capacity(module.packages.len());
    for package in &module.packages {
        if !seen.insert(package.path.as_str()) {
            return Err(CorpusError::Conflict(format!(
                "duplicate package {} in {}@{}",
                package.path, module.path, module.version
            )));
        }

        let inside = is_stdlib_module(&module.path)
            || package.path == module.path
            || directory_in_module(&package.path, &module.path);
        if !inside {
            return Err(CorpusError::Invalid(format!(
                "package {} is not under module {}",
                package.path, module.path
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl CorpusStore for MemoryCorpus {
    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> std::result::Result<SearchResponse, CorpusError> {
        let stemmer = english_stemmer();
        let tokens = tokenize_and_stem(query, &stemmer);
        if tokens.is_empty() {
            return Ok(SearchResponse::default());
        }

        let mut scored: Vec<(f64, &str, &IndexedPackage)> = self
            .packages
            .iter()
            .filter_map(|(path, package)| {
                let hits = package.terms.match_all(&tokens)?;
                let popularity = (std::f64::consts::E
                    + self.imported_by(path).unwrap_or(0) as f64)
                    .ln();
                Some((hits * popularity, path.as_str(), package))
            })
            .collect();

        scored.sort_by(|(a_score, a_path, _), (b_score, b_path, _)| {
            b_score.total_cmp(a_score).then_with(|| a_path.cmp(b_path))
        });

        let total = scored.len();
        let sigma = match self.approximate_above {
            Some(threshold) if total > threshold => ESTIMATE_SIGMA,
            _ => 0.0,
        };

        let matches = scored
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(score, path, package)| {
                let record = package.record();
                PackageMatch {
                    name: record.name.clone(),
                    package_path: path.to_string(),
                    module_path: package.module.path.clone(),
                    version: package.module.version.clone(),
                    commit_time: package.module.commit_time,
                    synopsis: record.synopsis.clone(),
                    licenses: record.licenses.clone(),
                    num_imported_by: self.imported_by(path),
                    score,
                }
            })
            .collect();

        Ok(SearchResponse {
            matches,
            total_estimate: total as u64,
            sigma,
        })
    }

    async fn lookup_module(
        &self,
        path: &str,
    ) -> std::result::Result<Option<ModuleRecord>, CorpusError> {
        Ok(self.latest.get(path).map(|m| m.as_ref().clone()))
    }

    async fn lookup_package(
        &self,
        path: &str,
    ) -> std::result::Result<Option<PackageRecord>, CorpusError> {
        Ok(self.packages.get(path).map(|p| p.record().clone()))
    }

    async fn lookup_directory_prefix(&self, path: &str) -> std::result::Result<bool, CorpusError> {
        if path.is_empty() || self.packages.contains_key(path) {
            return Ok(false);
        }

        let prefix = format!("{}/", path);
        let found = self
            .packages
            .range(prefix.clone()..)
            .take_while(|(package_path, _)| package_path.starts_with(&prefix))
            .any(|(_, package)| directory_in_module(path, &package.module.path));
        Ok(found)
    }

    async fn lookup_path(&self, path: &str) -> std::result::Result<Option<PathInfo>, CorpusError> {
        Ok(self.path_table.get(path))
    }
}
