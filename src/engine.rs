//! Request handling: redirect first, search otherwise.

use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::corpus::CorpusStore;
use crate::error::SearchError;
use crate::redirect::resolve_redirect;
use crate::search::{PaginationParams, SearchPage, fetch_search_page};
use std::sync::Arc;

/// Outcome of handling one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The query is an exact path; send the caller to this target.
    Redirect(String),
    /// An ordinary result page.
    Results(SearchPage),
}

/// Search front door shared by all requests.
///
/// Holds only read-only state: the store handle and configuration.
#[derive(Clone)]
pub struct Engine {
    corpus: Arc<dyn CorpusStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(corpus: Arc<dyn CorpusStore>, config: EngineConfig) -> Self {
        Self { corpus, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &dyn CorpusStore {
        self.corpus.as_ref()
    }

    /// A request context carrying the configured experiments.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_experiments(Arc::new(self.config.experiments()))
    }

    /// Validate page parameters, applying the configured default page size.
    pub fn params(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginationParams, SearchError> {
        let default_limit = i64::try_from(self.config.default_limit).unwrap_or(i64::MAX);
        PaginationParams::new(
            page.unwrap_or(1),
            limit.unwrap_or(default_limit),
            self.config.max_limit,
        )
    }

    /// Check a raw query before any store access.
    pub fn validate_query(&self, query: &str) -> Result<(), SearchError> {
        let length = query.chars().count();
        if length > self.config.max_query_length {
            return Err(SearchError::invalid(
                "q",
                format!(
                    "query is {} characters, the maximum is {}",
                    length, self.config.max_query_length
                ),
            ));
        }
        Ok(())
    }

    /// Resolve an exact-path redirect, or fall through to a search page.
    ///
    /// Exactly one of the two runs for a given request.
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        query: &str,
        params: PaginationParams,
    ) -> Result<QueryOutcome, SearchError> {
        self.validate_query(query)?;

        if let Some(target) = resolve_redirect(ctx, self.corpus(), query).await? {
            tracing::info!("Redirecting {:?} to {}", query, target);
            return Ok(QueryOutcome::Redirect(target));
        }

        let page = fetch_search_page(ctx, self.corpus(), query, params).await?;
        Ok(QueryOutcome::Results(page))
    }

    /// Run only the search half, ignoring redirects.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        params: PaginationParams,
    ) -> Result<SearchPage, SearchError> {
        self.validate_query(query)?;
        fetch_search_page(ctx, self.corpus(), query, params).await
    }

    /// Run only the redirect half.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        query: &str,
    ) -> Result<Option<String>, SearchError> {
        self.validate_query(query)?;
        resolve_redirect(ctx, self.corpus(), query).await
    }
}
