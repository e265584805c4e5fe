//! Core types: search requests, result records, provider outcomes and the
//! merged union result.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FailureKind, SearchError};

/// A single normalised search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Page or article title.
    pub title: String,
    /// Canonical link; the deduplication key.
    pub url: String,
    /// Short text excerpt.
    pub snippet: String,
    /// Label of the provider that produced this record.
    pub source: String,
    /// Publication time, when the provider supplied one that parsed.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Search topic hint forwarded to providers that support it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Recent news coverage.
    #[default]
    News,
    /// General web results.
    General,
}

impl Topic {
    /// Wire name used by the search API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much effort the search API should spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, cheaper search.
    #[default]
    Basic,
    /// Slower, more thorough search.
    Advanced,
}

impl SearchDepth {
    /// Wire name used by the search API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-query knobs beyond the query text and result budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Topic hint.
    pub topic: Topic,
    /// Search depth.
    pub depth: SearchDepth,
    /// Only return results from the last N days, where supported.
    pub freshness_days: Option<u32>,
}

/// A query plus its result budget and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Raw query text as supplied by the caller.
    pub query: String,
    /// Maximum number of merged records to return.
    pub max_results: usize,
    /// Topic, depth and freshness.
    pub options: SearchOptions,
}

impl SearchRequest {
    /// Build a request with default options (news topic, basic depth).
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            options: SearchOptions::default(),
        }
    }

    /// Set the topic hint.
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.options.topic = topic;
        self
    }

    /// Set the search depth.
    pub fn with_depth(mut self, depth: SearchDepth) -> Self {
        self.options.depth = depth;
        self
    }

    /// Restrict results to the last `days` days.
    pub fn with_freshness_days(mut self, days: u32) -> Self {
        self.options.freshness_days = Some(days);
        self
    }

    /// The query lower-cased with whitespace runs collapsed to one space.
    pub fn normalized_query(&self) -> String {
        normalize_query(&self.query)
    }

    /// Reject requests that must never reach the cache or a provider.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Validation(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.normalized_query().is_empty() {
            return Err(SearchError::Validation("query must not be empty".into()));
        }
        if self.options.freshness_days == Some(0) {
            return Err(SearchError::Validation(
                "freshness_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Lower-case a query and collapse all whitespace runs to single spaces.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// How much trust a provider places in the records it returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Results from the provider's primary backend.
    #[default]
    Full,
    /// Results from a keyless fallback source.
    Degraded,
}

/// A successful provider answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderHits {
    /// Records in the provider's own order.
    pub records: Vec<ResultRecord>,
    /// Whether these came from the primary backend or a fallback.
    pub confidence: Confidence,
}

impl ProviderHits {
    /// Full-confidence hits.
    pub fn full(records: Vec<ResultRecord>) -> Self {
        Self {
            records,
            confidence: Confidence::Full,
        }
    }

    /// Lower-confidence hits from a fallback source.
    pub fn degraded(records: Vec<ResultRecord>) -> Self {
        Self {
            records,
            confidence: Confidence::Degraded,
        }
    }
}

/// A recorded provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider name.
    pub provider: String,
    /// Coarse classification.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

/// The merged, deduplicated outcome of one search across all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionResult {
    /// Deduplicated records in provider-priority order.
    pub records: Vec<ResultRecord>,
    /// Providers invoked for this call. Empty on a cache hit.
    pub providers_attempted: Vec<String>,
    /// Providers that answered successfully during this call.
    pub providers_succeeded: Vec<String>,
    /// Providers that failed during this call.
    pub failures: Vec<ProviderFailure>,
    /// Providers whose answers the records were built from (also on cache hits).
    pub providers_used: Vec<String>,
    /// Providers that answered from a lower-confidence fallback.
    pub degraded_providers: Vec<String>,
    /// Whether the records were served from the cache.
    pub from_cache: bool,
    /// When the underlying provider data was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl UnionResult {
    /// `provider name → failure kind` for every failed provider.
    pub fn failure_reasons(&self) -> BTreeMap<String, String> {
        self.failures
            .iter()
            .map(|f| (f.provider.clone(), f.kind.as_str().to_string()))
            .collect()
    }

    /// True when any contributing provider answered from a fallback source.
    pub fn is_degraded(&self) -> bool {
        !self.degraded_providers.is_empty()
    }

    /// True when providers were attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.providers_attempted.is_empty() && self.providers_succeeded.is_empty()
    }
}

/// Best-effort timestamp parsing for provider date fields.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DDTHH:MM:SS` (assumed UTC) and bare
/// `YYYY-MM-DD` dates. Anything else, including relative ages such as
/// `"2 days ago"`, yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Feeds sometimes carry a weekday that disagrees with the date.
    if let Some((_, rest)) = raw.split_once(", ") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(rest) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
