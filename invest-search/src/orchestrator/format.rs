//! Compact, citation-friendly rendering of results for LLM prompts.

use crate::types::ResultRecord;

/// Placeholder returned when there is nothing to render.
pub const NO_RESULTS: &str = "(no search results)";

/// Render up to `limit` records as numbered blocks:
///
/// ```text
/// [1] (tavily) ACME beats estimates
/// URL: https://example.com/acme
/// Snippet: Strong quarter.
/// ```
///
/// Blocks are separated by a blank line. Returns [`NO_RESULTS`] when nothing
/// is rendered.
pub fn format_for_prompt(records: &[ResultRecord], limit: usize) -> String {
    let blocks: Vec<String> = records
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] ({}) {}\nURL: {}\nSnippet: {}",
                i + 1,
                r.source,
                r.title,
                r.url,
                r.snippet
            )
        })
        .collect();

    let text = blocks.join("\n\n");
    let text = text.trim();
    if text.is_empty() {
        NO_RESULTS.to_string()
    } else {
        text.to_string()
    }
}
