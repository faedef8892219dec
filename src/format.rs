//! Plain-text rendering of engine outcomes for tool callers.

use crate::engine::QueryOutcome;
use crate::search::SearchPage;
use std::fmt::Write as _;

/// Render a redirect or a result page.
pub fn format_outcome(query: &str, outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Redirect(target) => format_redirect(query, Some(target)),
        QueryOutcome::Results(page) => format_search_page(query, page),
    }
}

/// Render the result of a redirect lookup.
pub fn format_redirect(query: &str, target: Option<&str>) -> String {
    match target {
        Some(target) => format!("'{}' is an exact path. Redirect: {}\n", query, target),
        None => format!("'{}' does not name a module, package or directory.\n", query),
    }
}

/// Render one page of search results.
pub fn format_search_page(query: &str, page: &SearchPage) -> String {
    let pagination = &page.pagination;

    if page.results.is_empty() {
        let mut msg = if pagination.total_count == 0 {
            format!("No results found for '{}'.\n\n", query)
        } else {
            format!(
                "No results on page {} for '{}' ({} pages in total).\n\n",
                pagination.page,
                query,
                pagination.num_pages()
            )
        };
        msg.push_str("Search tips:\n");
        msg.push_str("• Every word must match; try fewer words\n");
        msg.push_str("• Search uses stemming: 'parsing' matches 'parse'\n");
        msg.push_str("• Enter a full import path to jump straight to it\n");
        return msg;
    }

    let first = (pagination.page - 1) * pagination.limit + 1;
    let last = first + pagination.result_count - 1;
    let about = if pagination.approximate { "about " } else { "" };

    let mut output = format!(
        "Results {}-{} of {}{} for '{}':\n\n",
        first, last, about, pagination.total_count, query
    );

    for (idx, result) in page.results.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) {}",
            first + idx,
            result.package_path,
            result.display_version,
            result.commit_time
        );
        if !result.synopsis.is_empty() {
            let _ = writeln!(output, "   {}", result.synopsis);
        }

        let mut details = vec![format!("module {}", result.module_path)];
        if !result.licenses.is_empty() {
            details.push(result.licenses.join(", "));
        }
        if result.num_imported_by > 0 {
            details.push(format!("imported by {}", result.num_imported_by));
        }
        let _ = writeln!(output, "   {}", details.join(" | "));
        output.push('\n');
    }

    if !pagination.pages.is_empty() {
        let pages: Vec<String> = pagination
            .pages
            .iter()
            .map(|p| {
                if *p == pagination.page {
                    format!("[{}]", p)
                } else {
                    p.to_string()
                }
            })
            .collect();
        let _ = write!(output, "Pages: {}", pages.join(" "));
        if pagination.prev_page != 0 {
            let _ = write!(output, " | prev: {}", pagination.prev_page);
        }
        if pagination.next_page != 0 {
            let _ = write!(output, " | next: {}", pagination.next_page);
        }
        output.push('\n');
    }

    output
}
