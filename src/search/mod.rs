//! Search result assembly.
//!
//! Turns a store's ranked matches and total estimate into a display page:
//! approximate counts, pagination state and display-ready result entries.

pub(crate) mod approximate;
pub(crate) mod page;
pub(crate) mod pagination;

pub use approximate::approximate_number;
pub use page::{
    SearchPage, SearchResult, absolute_time, display_version, elapsed_time, fetch_search_page,
};
pub use pagination::{DEFAULT_PAGES_TO_LINK, Pagination, PaginationParams, pages_to_link, plan};
