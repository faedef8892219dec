//! Per-request context: cancellation, experiments and the request clock.

use crate::error::SearchError;
use crate::experiment::Experiments;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a single request carries into the engine.
///
/// A context is created per request and dropped with it. It is cheap to clone;
/// clones share the same cancellation token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    experiments: Arc<Experiments>,
    now: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context with a fresh token, no experiments, and the current time.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            experiments: Arc::new(Experiments::none()),
            now: Utc::now(),
        }
    }

    pub fn with_experiments(mut self, experiments: Arc<Experiments>) -> Self {
        self.experiments = experiments;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pin the clock used for relative timestamps.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn experiments(&self) -> &Experiments {
        &self.experiments
    }

    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive a corpus call to completion unless the request is cancelled first.
    ///
    /// Cancellation wins ties, so an already-cancelled request never reaches the store.
    pub(crate) async fn run<T, E, F>(&self, call: F) -> Result<T, SearchError>
    where
        F: Future<Output = Result<T, E>>,
        SearchError: From<E>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SearchError::Cancelled),
            result = call => result.map_err(SearchError::from),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
