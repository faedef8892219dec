pub mod config;
pub mod context;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod format;
pub mod redirect;
pub mod search;
pub mod server;
pub mod tracing;

pub use config::EngineConfig;
pub use context::RequestContext;
pub use corpus::{
    CorpusSnapshot, CorpusStore, MemoryCorpus, ModuleRecord, PackageMatch, PackageRecord,
    PathInfo, PathKind, PathTable, SearchResponse,
};
pub use engine::{Engine, QueryOutcome};
pub use error::{CorpusError, SearchError};
pub use experiment::{Experiments, USE_PATH_TABLE};
pub use redirect::{clean_path, resolve_redirect};
pub use search::{
    Pagination, PaginationParams, SearchPage, SearchResult, approximate_number, fetch_search_page,
};
pub use server::SearchServer;
