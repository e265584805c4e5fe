//! Search manager: cache lookup, concurrent provider fan-out, merge, cache
//! population.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use crate::cache::CacheStore;
use crate::config::SearchConfig;
use crate::error::{CacheError, ProviderError, SearchError};
use crate::provider::SearchProvider;
use crate::providers::build_providers;
use crate::types::{Confidence, ProviderFailure, ProviderHits, SearchRequest, UnionResult};

use super::dedup::merge;
use super::fingerprint::Fingerprint;

/// Runs union searches across the configured providers.
///
/// # Pipeline
///
/// 1. Validate the request (no I/O on rejection)
/// 2. Return a fresh cache entry if one exists
/// 3. Fan out to every provider concurrently with [`futures::future::join_all`],
///    each bounded by `min(provider_timeout, overall_timeout)`
/// 4. Log and record every provider failure; keep going with the rest
/// 5. Merge successful batches in priority order, dedup by normalised URL,
///    truncate to `max_results`
/// 6. Cache the merged records unconditionally, empty results included
pub struct SearchManager {
    providers: Vec<Arc<dyn SearchProvider>>,
    cache: CacheStore,
    provider_timeout: Duration,
    overall_timeout: Duration,
}

impl SearchManager {
    /// Build a manager with the providers named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let providers = build_providers(config)?;
        Self::with_providers(config, providers)
    }

    /// Build a manager around caller-supplied providers, queried in the
    /// given order. Cache and timeout settings still come from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `providers` is empty or `config`
    /// is invalid.
    pub fn with_providers(
        config: &SearchConfig,
        providers: Vec<Arc<dyn SearchProvider>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        Ok(Self {
            providers,
            cache: CacheStore::new(&config.cache_dir, config.cache_ttl_seconds),
            provider_timeout: Duration::from_millis(config.provider_timeout_ms),
            overall_timeout: Duration::from_millis(config.overall_timeout_ms),
        })
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// The underlying cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Search `query` across all providers with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Validation`] for an empty query or a zero
    /// `max_results`. Provider and cache failures never surface as errors.
    pub async fn union_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<UnionResult, SearchError> {
        self.search(&SearchRequest::new(query, max_results)).await
    }

    /// Search with explicit topic, depth and freshness options.
    ///
    /// # Errors
    ///
    /// Same as [`union_search`](Self::union_search).
    pub async fn search(&self, request: &SearchRequest) -> Result<UnionResult, SearchError> {
        request.validate()?;

        let fingerprint = Fingerprint::of(request);
        tracing::trace!(query = %request.query, fingerprint = %fingerprint, "union search");

        if let Some(entry) = self.cache.get(&fingerprint).await {
            tracing::debug!(fingerprint = %fingerprint, records = entry.records.len(), "cache hit");
            let mut records = entry.records;
            records.truncate(request.max_results);
            return Ok(UnionResult {
                records,
                providers_attempted: Vec::new(),
                providers_succeeded: Vec::new(),
                failures: Vec::new(),
                providers_used: entry.providers_used,
                degraded_providers: entry.degraded_providers,
                from_cache: true,
                fetched_at: entry.created_at,
            });
        }

        let outcomes = self.fan_out(request).await;

        let mut attempted = Vec::with_capacity(outcomes.len());
        let mut succeeded = Vec::new();
        let mut degraded = Vec::new();
        let mut failures = Vec::new();
        let mut batches = Vec::new();

        for (provider, outcome) in outcomes {
            attempted.push(provider.clone());
            match outcome {
                Ok(hits) => {
                    tracing::debug!(provider = %provider, count = hits.records.len(), confidence = ?hits.confidence, "provider returned results");
                    if hits.confidence == Confidence::Degraded {
                        degraded.push(provider.clone());
                    }
                    succeeded.push(provider.clone());
                    batches.push((provider, hits.records));
                }
                Err(err) => {
                    if matches!(err, ProviderError::Unavailable(_)) {
                        tracing::info!(provider = %provider, reason = %err, "provider skipped");
                    } else {
                        tracing::warn!(provider = %provider, kind = %err.kind(), error = %err, "provider search failed");
                    }
                    failures.push(ProviderFailure {
                        provider,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let fetched_at = Utc::now();

        if succeeded.is_empty() {
            tracing::warn!(
                fingerprint = %fingerprint,
                failed = failures.len(),
                "all providers failed, caching empty result"
            );
        }

        let merged = merge(batches, request.max_results);

        if let Err(err) = self
            .cache
            .put(
                &fingerprint,
                &request.normalized_query(),
                &merged.records,
                &merged.providers_used,
                &degraded,
            )
            .await
        {
            tracing::warn!(fingerprint = %fingerprint, error = %err, "failed to write search cache");
        }

        Ok(UnionResult {
            records: merged.records,
            providers_attempted: attempted,
            providers_succeeded: succeeded,
            failures,
            providers_used: merged.providers_used,
            degraded_providers: degraded,
            from_cache: false,
            fetched_at,
        })
    }

    /// Remove stale and corrupt cache entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache directory cannot be read or an
    /// entry cannot be deleted.
    pub async fn sweep_cache(&self) -> Result<usize, CacheError> {
        self.cache.sweep_stale().await
    }

    /// Query every provider concurrently and wait for all outcomes.
    async fn fan_out(
        &self,
        request: &SearchRequest,
    ) -> Vec<(String, Result<ProviderHits, ProviderError>)> {
        let query = request.query.split_whitespace().collect::<Vec<_>>().join(" ");
        let bound = self.provider_timeout.min(self.overall_timeout);
        let deadline = Instant::now() + bound;
        let limited_by_overall = self.overall_timeout <= self.provider_timeout;

        let futures = self.providers.iter().map(|provider| {
            let query = query.as_str();
            async move {
                let name = provider.name().to_string();
                let outcome = tokio::time::timeout_at(
                    deadline,
                    provider.search(query, request.max_results, &request.options),
                )
                .await
                .unwrap_or_else(|_| {
                    let ms = bound.as_millis();
                    Err(ProviderError::Timeout(if limited_by_overall {
                        format!("overall search deadline of {ms} ms exceeded")
                    } else {
                        format!("no response within {ms} ms")
                    }))
                });
                (name, outcome)
            }
        });

        futures::future::join_all(futures).await
    }
}
