//! Page windows, offsets and navigation links for result pages.

use crate::error::SearchError;
use serde::Serialize;

/// How many page numbers to offer as navigation links.
pub const DEFAULT_PAGES_TO_LINK: usize = 5;

/// Validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    page: usize,
    limit: usize,
}

impl PaginationParams {
    /// Validate a 1-based page number and page size.
    ///
    /// Rejected before any corpus call: `page < 1`, `limit < 1`, `limit > max_limit`.
    pub fn new(page: i64, limit: i64, max_limit: usize) -> Result<Self, SearchError> {
        let page = usize::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| SearchError::invalid("page", format!("must be at least 1, got {}", page)))?;
        let limit = usize::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| {
                SearchError::invalid("limit", format!("must be at least 1, got {}", limit))
            })?;
        if limit > max_limit {
            return Err(SearchError::invalid(
                "limit",
                format!("must be at most {}, got {}", max_limit, limit),
            ));
        }
        // Offsets past usize::MAX cannot address anything.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(SearchError::invalid("page", "too large"));
        }
        Ok(Self { page, limit })
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of results to skip.
    pub const fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// Pagination state for one result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Number of results on all pages.
    pub total_count: u64,
    /// Number of results on this page.
    pub result_count: usize,
    /// The previous page number, or 0 if there is none.
    pub prev_page: usize,
    /// The next page number, or 0 if there is none.
    pub next_page: usize,
    /// The maximum number of results a page can have.
    pub limit: usize,
    /// The current page number.
    pub page: usize,
    /// Page numbers to render as links, strictly increasing.
    pub pages: Vec<usize>,
    /// Whether `total_count` is an approximation.
    pub approximate: bool,
}

impl Pagination {
    pub fn new(params: PaginationParams, result_count: usize, total_count: u64) -> Self {
        let PaginationParams { page, limit } = params;
        Self {
            total_count,
            result_count,
            prev_page: prev(page),
            next_page: next(page, limit, total_count),
            limit,
            page,
            pages: pages_to_link(page, num_pages(limit, total_count), DEFAULT_PAGES_TO_LINK),
            approximate: false,
        }
    }

    pub const fn with_approximate(mut self, approximate: bool) -> Self {
        self.approximate = approximate;
        self
    }

    /// Number of pages needed for `total_count`.
    pub fn num_pages(&self) -> usize {
        num_pages(self.limit, self.total_count)
    }
}

/// Plan a page without having fetched it: the result count is what a store
/// holding exactly `total_count` results would return for this page.
pub fn plan(params: PaginationParams, total_count: u64) -> Pagination {
    let remaining = total_count.saturating_sub(params.offset() as u64);
    let result_count = remaining.min(params.limit() as u64) as usize;
    Pagination::new(params, result_count, total_count)
}

fn prev(page: usize) -> usize {
    if page <= 1 { 0 } else { page - 1 }
}

fn next(page: usize, limit: usize, total_count: u64) -> usize {
    let seen = (page as u64).saturating_mul(limit as u64);
    if seen >= total_count { 0 } else { page + 1 }
}

fn num_pages(limit: usize, total_count: u64) -> usize {
    total_count.div_ceil(limit as u64) as usize
}

/// Page numbers to link from `page`.
///
/// A window of `pages_to_link` pages centred on `page`, shifted left near the
/// end and clamped to `1..=num_pages`. Page 1 is always included when there
/// is at least one page.
pub fn pages_to_link(page: usize, num_pages: usize, pages_to_link: usize) -> Vec<usize> {
    if num_pages == 0 || pages_to_link == 0 {
        return vec![];
    }

    let mut start = page.saturating_sub(pages_to_link / 2);
    if num_pages.saturating_sub(start) < pages_to_link {
        start = (num_pages + 1).saturating_sub(pages_to_link);
    }
    let start = start.max(1);
    let end = (start + pages_to_link - 1).min(num_pages);

    let mut pages = Vec::with_capacity(pages_to_link + 1);
    if start > 1 {
        pages.push(1);
    }
    pages.extend(start..=end);
    pages
}
