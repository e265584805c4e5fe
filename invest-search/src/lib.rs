//! # invest-search
//!
//! Multi-provider news search for the investment assistant.
//!
//! The same query goes to several independent search backends at once; their
//! answers are merged in priority order, deduplicated by normalised URL and
//! cached on disk. A provider that is unconfigured, slow or broken costs only
//! its own results, never the whole search.
//!
//! ## Design
//!
//! - [`SearchProvider`] implementations: the direct search API
//!   ([`providers::TavilyProvider`]) and a gateway-mediated web search
//!   ([`providers::GatewayProvider`]) that falls back to a public news feed
//! - [`SearchManager`] fans out with one deadline per call, merges, dedups and
//!   writes the [`CacheStore`]
//! - Cache entries are JSON files keyed by a SHA-256 [`Fingerprint`] of the
//!   normalised request and expire after a TTL (12 h by default)
//!
//! ## Security
//!
//! - API keys and gateway tokens are redacted from `Debug` output and never
//!   appear in error messages
//! - Search queries are logged only at trace level

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod types;

pub use cache::{CacheEntry, CacheStore};
pub use config::{GatewayConfig, ProviderKind, SearchConfig, TavilyConfig};
pub use error::{CacheError, FailureKind, ProviderError, Result, SearchError};
pub use orchestrator::fingerprint::Fingerprint;
pub use orchestrator::format::format_for_prompt;
pub use orchestrator::manager::SearchManager;
pub use orchestrator::url_normalize::normalize_url;
pub use provider::SearchProvider;
pub use types::{
    Confidence, ProviderFailure, ProviderHits, ResultRecord, SearchDepth, SearchOptions,
    SearchRequest, Topic, UnionResult,
};

/// Run one union search with a freshly built manager.
///
/// Convenience wrapper for one-off callers; long-lived callers should keep a
/// [`SearchManager`] so the HTTP client is reused.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid `config` and
/// [`SearchError::Validation`] for an empty query or zero `max_results`.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> invest_search::Result<()> {
/// let config = invest_search::SearchConfig::default();
/// let result = invest_search::union_search("ACME earnings", 5, &config).await?;
/// for record in &result.records {
///     println!("{} ({}): {}", record.title, record.source, record.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn union_search(
    query: &str,
    max_results: usize,
    config: &SearchConfig,
) -> Result<UnionResult> {
    SearchManager::new(config)?
        .union_search(query, max_results)
        .await
}
