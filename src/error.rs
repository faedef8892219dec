//! Error handling types and utilities.

use thiserror::Error;

/// A specialized Result type for binary and file-loading edges.
///
/// Library operations return [`SearchError`] or [`CorpusError`]; everything that
/// touches the filesystem or process setup uses `anyhow` with `.context()`.
pub type Result<T> = anyhow::Result<T>;

/// Error reported by a [`CorpusStore`](crate::corpus::CorpusStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorpusError {
    /// The requested module, package or path does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backing store could not serve the request.
    #[error("corpus unavailable: {0}")]
    Unavailable(String),
    /// A published module version already exists, or an import path is duplicated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A record violates a corpus invariant.
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl CorpusError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error returned by the search and redirect operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The corpus port failed. Never retried here.
    #[error("data access failed: {0}")]
    DataAccess(#[from] CorpusError),

    /// A request parameter was rejected before any corpus call was made.
    #[error("invalid value for {name:?}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The caller cancelled the request while a corpus call was in flight.
    #[error("request cancelled")]
    Cancelled,
}

impl SearchError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
