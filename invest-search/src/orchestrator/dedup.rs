//! Order-preserving merge and deduplication by normalised URL.
//!
//! Records are visited in provider-priority order; the first record seen for
//! a normalised URL wins and later duplicates are dropped. Records with an
//! empty URL are discarded.

use std::collections::HashSet;

use crate::types::ResultRecord;

use super::url_normalize::normalize_url;

/// Merged records plus the providers that contributed at least one of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    /// Deduplicated records, truncated to the requested budget.
    pub records: Vec<ResultRecord>,
    /// Contributing providers, in priority order.
    pub providers_used: Vec<String>,
}

/// Concatenate per-provider batches in the given order, deduplicate and
/// truncate to `max_results`.
pub fn merge(batches: Vec<(String, Vec<ResultRecord>)>, max_results: usize) -> Merged {
    let mut seen = HashSet::new();
    let mut merged = Merged::default();

    for (provider, records) in batches {
        for record in records {
            if merged.records.len() >= max_results {
                return merged;
            }
            if record.url.trim().is_empty() || !seen.insert(normalize_url(&record.url)) {
                continue;
            }
            if !merged.providers_used.contains(&provider) {
                merged.providers_used.push(provider.clone());
            }
            merged.records.push(record);
        }
    }
    merged
}
