//! Direct search API provider (Tavily).
//!
//! Sends a JSON `POST {base_url}/search` authenticated with a bearer key.
//! Without a configured key every call fails fast as unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TavilyConfig;
use crate::error::ProviderError;
use crate::provider::{map_http_error, map_transport_error, SearchProvider};
use crate::types::{parse_timestamp, ProviderHits, ResultRecord, SearchOptions};

/// Provider name and record source label.
pub const TAVILY: &str = "tavily";

/// Request body for the `/search` endpoint.
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    topic: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    include_domains: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    exclude_domains: &'a [String],
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, alias = "publishedDate")]
    published_date: Option<String>,
}

/// Direct search API provider.
pub struct TavilyProvider {
    config: TavilyConfig,
    client: reqwest::Client,
}

impl TavilyProvider {
    /// Create a provider with its own settings and a shared HTTP client.
    pub fn new(config: TavilyConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        TAVILY
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        options: &SearchOptions,
    ) -> Result<ProviderHits, ProviderError> {
        let Some(key) = self.config.key() else {
            return Err(ProviderError::Unavailable(
                "tavily api key not configured".into(),
            ));
        };

        tracing::trace!(query, max_results, "tavily search");

        let body = TavilyRequest {
            query,
            search_depth: options.depth.as_str(),
            max_results,
            topic: options.topic.as_str(),
            include_answer: false,
            include_raw_content: false,
            days: options.freshness_days,
            include_domains: &self.config.include_domains,
            exclude_domains: &self.config.exclude_domains,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(TAVILY, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(TAVILY, &e))?;

        if !status.is_success() {
            return Err(map_http_error(TAVILY, status, &text));
        }

        tracing::trace!(bytes = text.len(), "tavily response received");

        parse_tavily_response(&text, max_results).map(ProviderHits::full)
    }
}

/// Parse a `/search` response body into result records.
///
/// Extracted as a separate function for testability with canned JSON.
pub(crate) fn parse_tavily_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<ResultRecord>, ProviderError> {
    let parsed: TavilyResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("tavily response: {e}")))?;

    Ok(parsed
        .results
        .into_iter()
        .filter_map(|hit| {
            let title = hit.title.as_deref().unwrap_or_default().trim().to_string();
            let url = hit.url.as_deref().unwrap_or_default().trim().to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(ResultRecord {
                title,
                url,
                snippet: hit.content.as_deref().unwrap_or_default().trim().to_string(),
                source: TAVILY.to_string(),
                published_at: hit.published_date.as_deref().and_then(parse_timestamp),
            })
        })
        .take(max_results)
        .collect())
}
