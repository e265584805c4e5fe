//! News collector: the one place the rest of the assistant talks to the
//! search layer.
//!
//! Every call returns a [`NewsReport`], serialised as
//! `{"news": [...], "search_metadata": {...}}`. The shape never changes:
//! provider failures, cache hits and an empty result set all produce the
//! same two keys, with the details recorded in [`SearchMetadata`].

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use invest_search::{
    format_for_prompt, normalize_url, ResultRecord, SearchError, SearchManager, SearchRequest,
    Topic, UnionResult,
};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, NewsConfig};
use crate::error::Result;

/// One news item in the stable output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    pub title: String,
    /// Article link.
    pub url: String,
    /// Short excerpt.
    pub summary: String,
    /// Provider label (`tavily`, `gateway`, `news-feed`).
    pub source: String,
    /// Publication time, when known.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Publication day as `YYYY-MM-DD`, when known.
    #[serde(default)]
    pub date: Option<String>,
    /// Which stock news dimension produced the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

impl NewsItem {
    fn from_record(record: ResultRecord, dimension: Option<&str>) -> Self {
        Self {
            date: record.published_at.map(|t| t.format("%Y-%m-%d").to_string()),
            title: record.title,
            url: record.url,
            summary: record.snippet,
            source: record.source,
            published_at: record.published_at,
            dimension: dimension.map(String::from),
        }
    }

    fn to_record(&self) -> ResultRecord {
        ResultRecord {
            title: self.title.clone(),
            url: self.url.clone(),
            snippet: self.summary.clone(),
            source: self.source.clone(),
            published_at: self.published_at,
        }
    }
}

/// A dimension whose search could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDimension {
    /// Dimension label.
    pub dimension: String,
    /// Why it failed.
    pub error: String,
}

/// Attempt metadata attached to every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub providers_attempted: Vec<String>,
    pub providers_succeeded: Vec<String>,
    /// `provider → failure kind` (`unavailable`, `timeout`, `error`) for
    /// providers that failed in every dimension they were tried in. Keeps
    /// the kind of the first failure; `search_warnings` lists each one.
    pub providers_failed_with_reason: BTreeMap<String, String>,
    /// True when every answered dimension came from the cache.
    pub from_cache: bool,
    /// Age of the oldest data in the report.
    pub fetched_at: DateTime<Utc>,
    pub providers_used: Vec<String>,
    pub degraded: bool,
    pub degraded_providers: Vec<String>,
    pub search_warnings: Vec<String>,
    pub total_dimensions: usize,
    pub successful_dimensions: usize,
    pub failed_dimensions: Vec<FailedDimension>,
}

/// The stable `{news, search_metadata}` contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsReport {
    pub news: Vec<NewsItem>,
    pub search_metadata: SearchMetadata,
}

impl NewsReport {
    /// Render the first `limit` items as a numbered block for an LLM prompt.
    pub fn prompt_digest(&self, limit: usize) -> String {
        let records: Vec<ResultRecord> = self.news.iter().map(NewsItem::to_record).collect();
        format_for_prompt(&records, limit)
    }
}

/// Outcome of one dimension's union search.
struct DimensionOutcome {
    label: String,
    result: std::result::Result<UnionResult, SearchError>,
}

/// Collects news through a [`SearchManager`] and reshapes it into
/// [`NewsReport`]s.
pub struct NewsCollector {
    manager: SearchManager,
    settings: NewsConfig,
}

impl NewsCollector {
    /// Build a collector and its search manager from application config.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let manager = SearchManager::new(&config.search)?;
        Ok(Self::with_manager(config.news.clone(), manager))
    }

    /// Wrap an existing manager.
    pub fn with_manager(settings: NewsConfig, manager: SearchManager) -> Self {
        Self { manager, settings }
    }

    /// The underlying search manager.
    pub fn manager(&self) -> &SearchManager {
        &self.manager
    }

    /// Search news for a free-form query.
    ///
    /// `max_results` falls back to `news.default_max_results`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Search`](crate::AssistantError::Search) for an
    /// empty query or a zero result budget. Provider failures are reported in
    /// the metadata instead.
    pub async fn collect_news(&self, query: &str, max_results: Option<usize>) -> Result<NewsReport> {
        let max = max_results.unwrap_or(self.settings.default_max_results);
        let request = SearchRequest::new(query, max);
        let result = self.manager.search(&request).await?;
        let outcome = DimensionOutcome {
            label: query.trim().to_string(),
            result: Ok(result),
        };
        Ok(fold(vec![outcome], false, max))
    }

    /// Search news about a stock along the topical [`STOCK_DIMENSIONS`].
    ///
    /// Up to `news.max_related_entities` non-blank related entities are
    /// appended to the industry and competition query. Items are tagged
    /// with their dimension, deduplicated across dimensions by normalised
    /// URL, ordered newest first (undated items last) and capped at
    /// `news.max_total_items`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Search`](crate::AssistantError::Search) if the
    /// stock name is blank. Dimension failures are recorded in the metadata.
    pub async fn collect_for_stock(
        &self,
        stock_name: &str,
        related_entities: &[String],
        time_range_days: Option<u32>,
    ) -> Result<NewsReport> {
        let days = time_range_days.unwrap_or(self.settings.default_time_range_days);
        let max = self.settings.default_max_results;
        let stock = stock_name.trim();

        let request = |query: &str| {
            SearchRequest::new(query, max)
                .with_topic(Topic::News)
                .with_freshness_days(days)
        };

        request(stock).validate()?;

        let entities: Vec<&str> = related_entities
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .take(self.settings.max_related_entities)
            .collect();
        let dimensions = stock_dimensions(stock, &entities);
        tracing::debug!(
            dimensions = dimensions.len(),
            entities = entities.len(),
            days,
            "collecting stock news"
        );

        let searches = dimensions.into_iter().map(|(label, query)| {
            let request = request(&query);
            async move {
                DimensionOutcome {
                    label: label.to_string(),
                    result: self.manager.search(&request).await,
                }
            }
        });
        let outcomes = join_all(searches).await;

        Ok(fold(outcomes, true, self.settings.max_total_items))
    }
}

/// Stock news dimensions as `(label, query keywords)`.
///
/// Each query is the stock name followed by the keywords. Related entities
/// extend the [`COMPETITION_DIMENSION`] query.
pub const STOCK_DIMENSIONS: [(&str, &str); 4] = [
    (
        "company core news",
        "earnings results announcements management major events",
    ),
    (
        COMPETITION_DIMENSION,
        "competitors industry landscape market share",
    ),
    (
        "products & technology",
        "new products technology R&D innovation patents",
    ),
    ("macro & policy", "policy regulation subsidies rules"),
];

/// Label of the dimension that carries related entities.
pub const COMPETITION_DIMENSION: &str = "industry & competition";

fn stock_dimensions(stock: &str, entities: &[&str]) -> Vec<(&'static str, String)> {
    STOCK_DIMENSIONS
        .iter()
        .map(|&(label, keywords)| {
            let mut query = format!("{stock} {keywords}");
            if label == COMPETITION_DIMENSION {
                for entity in entities {
                    query.push(' ');
                    query.push_str(entity);
                }
            }
            (label, query)
        })
        .collect()
}

fn push_unique(list: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !list.contains(item) {
            list.push(item.clone());
        }
    }
}

/// Merge dimension outcomes into one report.
fn fold(outcomes: Vec<DimensionOutcome>, tag_items: bool, cap: usize) -> NewsReport {
    let multi = outcomes.len() > 1;
    let mut news = Vec::new();
    let mut seen = HashSet::new();

    let mut attempted = Vec::new();
    let mut succeeded = Vec::new();
    let mut used = Vec::new();
    let mut degraded = Vec::new();
    let mut failed_with_reason = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut failed_dimensions = Vec::new();
    let mut successful_dimensions = 0usize;
    let mut cached = 0usize;
    let mut oldest: Option<DateTime<Utc>> = None;

    let total_dimensions = outcomes.len();

    for DimensionOutcome { label, result } in outcomes {
        let prefix = if multi { format!("[{label}] ") } else { String::new() };

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(dimension = %label, error = %err, "dimension search rejected");
                warnings.push(format!("{prefix}{err}"));
                failed_dimensions.push(FailedDimension {
                    dimension: label,
                    error: err.to_string(),
                });
                continue;
            }
        };

        push_unique(&mut attempted, &result.providers_attempted);
        push_unique(&mut succeeded, &result.providers_succeeded);
        push_unique(&mut used, &result.providers_used);
        push_unique(&mut degraded, &result.degraded_providers);
        for failure in &result.failures {
            failed_with_reason
                .entry(failure.provider.clone())
                .or_insert_with(|| failure.kind.as_str().to_string());
            warnings.push(format!(
                "{prefix}{} {}: {}",
                failure.provider, failure.kind, failure.message
            ));
        }

        if result.all_failed() {
            failed_dimensions.push(FailedDimension {
                dimension: label,
                error: "all providers failed".into(),
            });
            continue;
        }

        successful_dimensions += 1;
        if result.from_cache {
            cached += 1;
        }
        oldest = Some(oldest.map_or(result.fetched_at, |t| t.min(result.fetched_at)));

        let dimension = tag_items.then_some(label.as_str());
        for record in result.records {
            if seen.insert(normalize_url(&record.url)) {
                news.push(NewsItem::from_record(record, dimension));
            }
        }
    }

    // A provider that answered any dimension is not reported as failed.
    failed_with_reason.retain(|provider, _| !succeeded.contains(provider));

    if tag_items {
        news.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }
    news.truncate(cap);

    if !degraded.is_empty() {
        warnings.push(format!(
            "degraded mode: results include fallback sources from {}",
            degraded.join(", ")
        ));
    }

    NewsReport {
        news,
        search_metadata: SearchMetadata {
            providers_attempted: attempted,
            providers_succeeded: succeeded,
            providers_failed_with_reason: failed_with_reason,
            from_cache: successful_dimensions > 0 && cached == successful_dimensions,
            fetched_at: oldest.unwrap_or_else(Utc::now),
            providers_used: used,
            degraded: !degraded.is_empty(),
            degraded_providers: degraded,
            search_warnings: warnings,
            total_dimensions,
            successful_dimensions,
            failed_dimensions,
        },
    }
}
