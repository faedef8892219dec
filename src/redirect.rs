//! Exact-path redirects for search queries.
//!
//! A query that names a module, package or directory in the corpus skips
//! search and goes straight to that path's page. Only queries with at least
//! one `/` are considered, so bare identifiers such as `std` or `errors` always
//! fall through to search even when a standard-library package has that name.

use crate::context::RequestContext;
use crate::corpus::{CorpusStore, PathKind};
use crate::error::{CorpusError, SearchError};
use crate::experiment::USE_PATH_TABLE;

/// Resolve `query` to a redirect target, or `None` to run an ordinary search.
///
/// Module roots redirect to `/mod/<path>`; packages and directories redirect
/// to `/<path>`. A `NotFound` from the store is the same as absent; any other
/// store error is returned.
pub async fn resolve_redirect(
    ctx: &RequestContext,
    corpus: &dyn CorpusStore,
    query: &str,
) -> Result<Option<String>, SearchError> {
    let requested = clean_path(query.trim());
    if !requested.contains('/') {
        return Ok(None);
    }

    let kind = if ctx.experiments().is_active(USE_PATH_TABLE) {
        from_path_table(ctx, corpus, &requested).await?
    } else {
        from_live_lookups(ctx, corpus, &requested).await?
    };

    let target = kind.map(|kind| match kind {
        PathKind::Module => format!("/mod/{}", requested),
        PathKind::Package | PathKind::Directory => format!("/{}", requested),
    });
    tracing::debug!("Redirect for {:?}: {:?}", query, target);
    Ok(target)
}

async fn from_path_table(
    ctx: &RequestContext,
    corpus: &dyn CorpusStore,
    path: &str,
) -> Result<Option<PathKind>, SearchError> {
    let info = ctx.run(not_found_as_none(corpus.lookup_path(path))).await?;
    Ok(info.flatten().map(|info| info.kind))
}

async fn from_live_lookups(
    ctx: &RequestContext,
    corpus: &dyn CorpusStore,
    path: &str,
) -> Result<Option<PathKind>, SearchError> {
    let module = ctx.run(not_found_as_none(corpus.lookup_module(path))).await?;
    if module.flatten().is_some() {
        return Ok(Some(PathKind::Module));
    }

    let package = ctx.run(not_found_as_none(corpus.lookup_package(path))).await?;
    if package.flatten().is_some() {
        return Ok(Some(PathKind::Package));
    }

    let is_dir = ctx
        .run(not_found_as_none(corpus.lookup_directory_prefix(path)))
        .await?;
    Ok(is_dir.unwrap_or(false).then_some(PathKind::Directory))
}

/// Maps `CorpusError::NotFound` to `Ok(None)` and wraps hits in `Some`.
async fn not_found_as_none<T>(
    lookup: impl Future<Output = Result<T, CorpusError>>,
) -> Result<Option<T>, CorpusError> {
    match lookup.await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated slashes, drops `.` elements and trailing slashes, and
/// resolves `..` against the preceding element. A rooted path stays rooted;
/// `..` cannot climb above the root of a rooted path.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for element in path.split('/') {
        match element {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(element),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
