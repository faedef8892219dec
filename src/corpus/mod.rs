//! Corpus access port and the records it serves.
//!
//! The engine never talks to a database directly. Everything it needs from the
//! indexed store goes through [`CorpusStore`]:
//!
//! - ranked full-text matches with a total estimate ([`CorpusStore::search`])
//! - exact module and package lookups
//! - directory existence, derived live from package paths
//! - precomputed path classification ([`CorpusStore::lookup_path`])
//!
//! [`MemoryCorpus`] is the in-process backing used by the binary and the tests.

pub(crate) mod memory;
pub(crate) mod path_table;
pub(crate) mod tokenize;

pub use memory::{CorpusSnapshot, MemoryCorpus};
pub use path_table::{PathInfo, PathKind, PathTable, snapshot_fingerprint};

use crate::error::CorpusError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Module path of the reserved standard-library root.
///
/// Packages in this module have bare import paths such as `fmt` or `cmd/go`.
pub const STDLIB_MODULE: &str = "std";

/// Check if a module path is the standard-library root.
pub fn is_stdlib_module(module_path: &str) -> bool {
    module_path == STDLIB_MODULE
}

/// A published module version and its packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub path: String,
    pub version: String,
    pub commit_time: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_redistributable: bool,
    #[serde(default)]
    pub readme: String,
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
}

/// A package inside a module, addressed by its full import path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default = "default_true")]
    pub is_redistributable: bool,
}

const fn default_true() -> bool {
    true
}

/// A raw ranked match as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMatch {
    pub name: String,
    pub package_path: String,
    pub module_path: String,
    pub version: String,
    pub commit_time: DateTime<Utc>,
    pub synopsis: String,
    pub licenses: Vec<String>,
    /// Reverse-dependency count, if the store tracks it.
    pub num_imported_by: Option<u64>,
    pub score: f64,
}

/// One page of ranked matches plus the store's estimate of all matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub matches: Vec<PackageMatch>,
    /// Estimated number of matches across all pages.
    pub total_estimate: u64,
    /// Relative standard error of `total_estimate`; 0 means the count is exact.
    pub sigma: f64,
}

impl SearchResponse {
    pub fn is_approximate(&self) -> bool {
        self.sigma > 0.0
    }
}

/// Read access to the indexed corpus.
///
/// All lookups consider only the latest version of each module. Implementations
/// must provide a consistent read view per call; the engine does no locking.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Ranked matches for `query`, skipping `offset` and returning at most `limit`.
    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResponse, CorpusError>;

    /// The latest version of the module at exactly `path`.
    async fn lookup_module(&self, path: &str) -> Result<Option<ModuleRecord>, CorpusError>;

    /// The package at exactly `path`.
    async fn lookup_package(&self, path: &str) -> Result<Option<PackageRecord>, CorpusError>;

    /// True if `path` is a strict prefix of some package path inside its module.
    async fn lookup_directory_prefix(&self, path: &str) -> Result<bool, CorpusError>;

    /// Classify `path` from a precomputed path table.
    async fn lookup_path(&self, path: &str) -> Result<Option<PathInfo>, CorpusError>;
}
