//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_module`: builds a module whose packages sit at `<module>/<suffix>`
//!   (or at the bare suffix for the `std` module); `""` is the module root
//! - `ScriptedCorpus`: a store with canned replies that counts its calls, for
//!   error, ordering and cancellation tests
//! - `fixed_now`: the clock every test context is pinned to

#![allow(dead_code)] // Helpers are shared across different integration test crates

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use modsearch::{
    CorpusError, CorpusStore, ModuleRecord, PackageMatch, PackageRecord, PathInfo,
    RequestContext, SearchResponse,
};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SAMPLE_VERSION: &str = "v1.0.0";

/// Fixed "now" for deterministic relative timestamps.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap()
}

/// A request context pinned to [`fixed_now`].
pub fn test_context() -> RequestContext {
    modsearch::tracing::init();
    RequestContext::new().with_now(fixed_now())
}

/// Build a module with packages at the given path suffixes.
pub fn sample_module(module_path: &str, version: &str, suffixes: &[&str]) -> ModuleRecord {
    let packages = suffixes
        .iter()
        .map(|suffix| {
            let path = if suffix.is_empty() {
                module_path.to_string()
            } else if module_path == "std" {
                (*suffix).to_string()
            } else {
                format!("{}/{}", module_path, suffix)
            };
            sample_package(&path, "")
        })
        .collect();

    ModuleRecord {
        path: module_path.to_string(),
        version: version.to_string(),
        commit_time: fixed_now(),
        is_redistributable: true,
        readme: "readme".to_string(),
        packages,
    }
}

/// A redistributable MIT package named after its last path element.
pub fn sample_package(path: &str, synopsis: &str) -> PackageRecord {
    PackageRecord {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        synopsis: synopsis.to_string(),
        licenses: vec!["MIT".to_string()],
        is_redistributable: true,
    }
}

/// A raw match as a store would return it.
pub fn sample_match(package_path: &str, score: f64) -> PackageMatch {
    PackageMatch {
        name: package_path.rsplit('/').next().unwrap_or(package_path).to_string(),
        package_path: package_path.to_string(),
        module_path: package_path.to_string(),
        version: SAMPLE_VERSION.to_string(),
        commit_time: fixed_now(),
        synopsis: String::new(),
        licenses: vec![],
        num_imported_by: None,
        score,
    }
}

/// Store with canned replies.
#[derive(Debug, Default)]
pub struct ScriptedCorpus {
    /// Reply to every search; `None` means an empty exact reply.
    pub search_reply: Option<Result<SearchResponse, CorpusError>>,
    /// Error returned by every lookup, if set.
    pub lookup_error: Option<CorpusError>,
    /// Never complete any call.
    pub hang: bool,
    calls: AtomicUsize,
}

impl ScriptedCorpus {
    pub fn replying(response: SearchResponse) -> Self {
        Self {
            search_reply: Some(Ok(response)),
            ..Self::default()
        }
    }

    pub fn failing(error: CorpusError) -> Self {
        Self {
            search_reply: Some(Err(error.clone())),
            lookup_error: Some(error),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
    }

    fn lookup<T>(&self, absent: T) -> Result<T, CorpusError> {
        match &self.lookup_error {
            Some(e) => Err(e.clone()),
            None => Ok(absent),
        }
    }
}

#[async_trait]
impl CorpusStore for ScriptedCorpus {
    async fn search(
        &self,
        _query: &str,
        _offset: usize,
        _limit: usize,
    ) -> Result<SearchResponse, CorpusError> {
        self.enter().await;
        self.search_reply
            .clone()
            .unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    async fn lookup_module(&self, _path: &str) -> Result<Option<ModuleRecord>, CorpusError> {
        self.enter().await;
        self.lookup(None)
    }

    async fn lookup_package(&self, _path: &str) -> Result<Option<PackageRecord>, CorpusError> {
        self.enter().await;
        self.lookup(None)
    }

    async fn lookup_directory_prefix(&self, _path: &str) -> Result<bool, CorpusError> {
        self.enter().await;
        self.lookup(false)
    }

    async fn lookup_path(&self, _path: &str) -> Result<Option<PathInfo>, CorpusError> {
        self.enter().await;
        self.lookup(None)
    }
}
