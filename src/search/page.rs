//! Search result page assembly.

use super::approximate::approximate_number;
use super::pagination::{Pagination, PaginationParams};
use crate::context::RequestContext;
use crate::corpus::{CorpusStore, PackageMatch};
use crate::error::SearchError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Matches pseudo-versions such as `v0.0.0-20190311183353-d8887717615a`.
static PSEUDO_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(v\d+\.\d+\.\d+)-(?:[0-9A-Za-z.]+\.)?(\d{14})-([0-9A-Za-z]+)(\+incompatible)?$")
        .expect("pseudo-version pattern is valid")
});

/// A display-ready search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub package_path: String,
    pub module_path: String,
    pub synopsis: String,
    pub display_version: String,
    pub licenses: Vec<String>,
    /// Human-relative commit time, e.g. "3 days ago".
    pub commit_time: String,
    pub num_imported_by: u64,
}

impl SearchResult {
    fn from_match(m: PackageMatch, now: DateTime<Utc>) -> Self {
        Self {
            display_version: display_version(&m.version),
            commit_time: elapsed_time(m.commit_time, now),
            num_imported_by: m.num_imported_by.unwrap_or(0),
            name: m.name,
            package_path: m.package_path,
            module_path: m.module_path,
            synopsis: m.synopsis,
            licenses: m.licenses,
        }
    }
}

/// One page of search results with its pagination state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub pagination: Pagination,
    pub results: Vec<SearchResult>,
}

impl SearchPage {
    fn empty(params: PaginationParams) -> Self {
        Self {
            pagination: Pagination::new(params, 0, 0),
            results: vec![],
        }
    }
}

/// Run `query` against the corpus and assemble the requested page.
///
/// Result order is the store's ranking order. A blank query yields an empty
/// page without touching the store. Store failures and cancellation produce
/// no page at all.
pub async fn fetch_search_page(
    ctx: &RequestContext,
    corpus: &dyn CorpusStore,
    query: &str,
    params: PaginationParams,
) -> Result<SearchPage, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchPage::empty(params));
    }

    let response = ctx
        .run(corpus.search(query, params.offset(), params.limit()))
        .await
        .inspect_err(|e| tracing::warn!("Search for {:?} failed: {}", query, e))?;

    let approximate = response.is_approximate();
    let total_count = if approximate {
        approximate_number(response.total_estimate, response.sigma)
    } else {
        response.total_estimate
    };

    let result_count = response.matches.len();
    let pagination = Pagination::new(params, result_count, total_count).with_approximate(approximate);

    let now = ctx.now();
    let results = response
        .matches
        .into_iter()
        .map(|m| SearchResult::from_match(m, now))
        .collect();

    tracing::debug!(
        "Search {:?}: page {} with {} of {}{} results",
        query,
        params.page(),
        result_count,
        if approximate { "about " } else { "" },
        total_count
    );

    Ok(SearchPage {
        pagination,
        results,
    })
}

/// Human-readable, relative timestamp:
///
/// - "1 hour ago" / "N hours ago" under 6 hours
/// - "today" under a day
/// - "1 day ago" / "N days ago" under 6 days
/// - an absolute date like "Jan 2, 2006" for anything older
pub fn elapsed_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed_hours = (now - date).num_hours().max(0);
    if elapsed_hours == 1 {
        return "1 hour ago".to_string();
    } else if elapsed_hours < 6 {
        return format!("{} hours ago", elapsed_hours);
    }

    match elapsed_hours / 24 {
        0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        days @ 2..6 => format!("{} days ago", days),
        _ => absolute_time(date),
    }
}

/// Date in the form "Jan 2, 2006" (UTC).
pub fn absolute_time(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Version string as shown next to a result.
///
/// Pseudo-versions are shortened to their base version and the first seven
/// characters of the revision: `v0.0.0-20190311183353-d8887717615a` becomes
/// `v0.0.0-...-d888771`. Other versions are shown unchanged.
pub fn display_version(version: &str) -> String {
    let Some(caps) = PSEUDO_VERSION.captures(version) else {
        return version.to_string();
    };

    let base = &caps[1];
    let revision = &caps[3];
    let short: String = revision.chars().take(7).collect();
    let incompatible = caps.get(4).map_or("", |m| m.as_str());
    format!("{}-...-{}{}", base, short, incompatible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(Duration::minutes(30), "0 hours ago")]
    #[case(Duration::hours(1), "1 hour ago")]
    #[case(Duration::hours(5), "5 hours ago")]
    #[case(Duration::hours(6), "today")]
    #[case(Duration::hours(23), "today")]
    #[case(Duration::hours(24), "1 day ago")]
    #[case(Duration::days(2), "2 days ago")]
    #[case(Duration::days(5), "5 days ago")]
    #[case(Duration::days(6), "Jun 9, 2020")]
    #[case(Duration::days(166), "Jan 1, 2020")]
    #[case(Duration::hours(-3), "0 hours ago")]
    fn test_elapsed_time(#[case] age: Duration, #[case] want: &str) {
        assert_eq!(elapsed_time(now() - age, now()), want);
    }

    #[rstest]
    #[case("v1.0.0", "v1.0.0")]
    #[case("v1.2.3-rc.1", "v1.2.3-rc.1")]
    #[case("v0.0.0-20190311183353-d8887717615a", "v0.0.0-...-d888771")]
    #[case("v1.2.4-0.20191109021931-daa7c04131f5", "v1.2.4-...-daa7c04")]
    #[case("v1.2.4-pre.0.20191109021931-daa7c04131f5", "v1.2.4-...-daa7c04")]
    #[case(
        "v2.0.1-0.20191109021931-daa7c04131f5+incompatible",
        "v2.0.1-...-daa7c04+incompatible"
    )]
    fn test_display_version(#[case] version: &str, #[case] want: &str) {
        assert_eq!(display_version(version), want);
    }
}
