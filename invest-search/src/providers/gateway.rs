//! Gateway-mediated web search provider.
//!
//! The secondary engine is never called directly. Requests go through the
//! tool gateway as `POST {url}/tools/invoke` with body
//! `{"tool": "web_search", "args": {...}}`. When the gateway URL or token is
//! missing the provider answers from the public news feed instead and marks
//! its hits as degraded.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{ProviderError, SearchError};
use crate::provider::{map_http_error, map_transport_error, SearchProvider};
use crate::types::{parse_timestamp, ProviderHits, ResultRecord, SearchOptions};

use super::feed::NewsFeed;
use super::strip_tags;

/// Provider name and record source label.
pub const GATEWAY: &str = "gateway";

/// Page limit of the engine behind the gateway.
pub const MAX_COUNT: usize = 10;

/// Where a query is sent.
enum Route {
    Gateway { url: String, token: String },
    Feed(NewsFeed),
    Disabled,
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    tool: &'static str,
    args: WebSearchArgs<'a>,
}

#[derive(Debug, Serialize)]
struct WebSearchArgs<'a> {
    query: &'a str,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    freshness: Option<&'static str>,
}

/// Web search through the tool gateway, with a news-feed fallback.
pub struct GatewayProvider {
    route: Route,
    client: reqwest::Client,
}

impl GatewayProvider {
    /// Build the provider from gateway settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the feed fallback is needed and its
    /// URL is invalid.
    pub fn new(config: &GatewayConfig, client: reqwest::Client) -> Result<Self, SearchError> {
        let route = match config.endpoint() {
            Some((url, token)) => Route::Gateway {
                url: url.to_string(),
                token: token.to_string(),
            },
            None if config.feed_fallback => Route::Feed(NewsFeed::new(config, client.clone())?),
            None => Route::Disabled,
        };
        Ok(Self { route, client })
    }

    /// Whether queries are answered by the fallback feed.
    pub fn uses_feed(&self) -> bool {
        matches!(self.route, Route::Feed(_))
    }

    async fn invoke(
        &self,
        url: &str,
        token: &str,
        query: &str,
        max_results: usize,
        options: &SearchOptions,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        let count = max_results.clamp(1, MAX_COUNT);
        let body = InvokeRequest {
            tool: "web_search",
            args: WebSearchArgs {
                query,
                count,
                freshness: options.freshness_days.map(freshness_param),
            },
        };

        let response = self
            .client
            .post(format!("{url}/tools/invoke"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(GATEWAY, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(GATEWAY, &e))?;
        if !status.is_success() {
            return Err(map_http_error(GATEWAY, status, &text));
        }

        tracing::trace!(bytes = text.len(), "gateway response received");

        parse_gateway_response(&text, count)
    }
}

#[async_trait]
impl SearchProvider for GatewayProvider {
    fn name(&self) -> &str {
        GATEWAY
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        options: &SearchOptions,
    ) -> Result<ProviderHits, ProviderError> {
        match &self.route {
            Route::Gateway { url, token } => {
                tracing::trace!(query, max_results, "gateway web_search");
                self.invoke(url, token, query, max_results, options)
                    .await
                    .map(ProviderHits::full)
            }
            Route::Feed(feed) => {
                tracing::trace!(query, max_results, "gateway not configured, using news feed");
                feed.fetch(query, max_results, options.freshness_days)
                    .await
                    .map(ProviderHits::degraded)
            }
            Route::Disabled => Err(ProviderError::Unavailable(
                "gateway url/token not configured and feed fallback disabled".into(),
            )),
        }
    }
}

/// Map a freshness window in days onto the engine's coarse buckets.
fn freshness_param(days: u32) -> &'static str {
    match days {
        0..=1 => "pd",
        2..=7 => "pw",
        8..=31 => "pm",
        _ => "py",
    }
}

/// Parse a `/tools/invoke` response into result records.
///
/// Accepts the wrapped `{ok, result: {results}}` shape (also with the
/// results under `result.details`) and a bare `{results}` object.
pub(crate) fn parse_gateway_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<ResultRecord>, ProviderError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("gateway response: {e}")))?;

    if value.get("ok").and_then(Value::as_bool) == Some(false) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ProviderError::Http(format!("gateway tool call failed: {message}")));
    }

    let results = ["/result/results", "/result/details/results", "/results"]
        .iter()
        .find_map(|ptr| value.pointer(ptr).and_then(Value::as_array))
        .ok_or_else(|| ProviderError::Malformed("gateway response has no results array".into()))?;

    Ok(results
        .iter()
        .filter_map(|entry| {
            let text = |key: &str| {
                entry
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default()
            };
            let title = strip_tags(text("title"));
            let url = text("url").to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            let snippet = ["description", "snippet"]
                .into_iter()
                .map(|k| strip_tags(text(k)))
                .find(|s| !s.is_empty())
                .unwrap_or_default();
            let published_at = ["age", "published", "page_age"]
                .into_iter()
                .find_map(|k| parse_timestamp(text(k)));
            Some(ResultRecord {
                title,
                url,
                snippet,
                source: GATEWAY.to_string(),
                published_at,
            })
        })
        .take(max_results)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_results() {
        let body = r#"{"ok": true, "result": {"results": [
            {"title": "ACME <strong>rallies</strong>", "url": "https://a.example.com/1", "description": "Shares &amp; bonds", "age": "2 days ago", "page_age": "2026-02-03T10:00:00"},
            {"title": "", "url": "https://a.example.com/2"},
            {"title": "Second", "url": "https://a.example.com/3", "snippet": "alt snippet", "published": "2026-02-01"}
        ]}}"#;
        let records = parse_gateway_response(body, 10).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "ACME rallies");
        assert_eq!(records[0].snippet, "Shares & bonds");
        assert_eq!(records[0].source, "gateway");
        assert!(records[0].published_at.is_some());
        assert_eq!(records[1].snippet, "alt snippet");
        assert!(records[1].published_at.is_some());
    }

    #[test]
    fn parses_bare_results() {
        let body = r#"{"results": [{"title": "T", "url": "https://b.example.com"}]}"#;
        let records = parse_gateway_response(body, 10).expect("parse");
        assert_eq!(records.len(), 1);
        assert!(records[0].snippet.is_empty());
        assert!(records[0].published_at.is_none());
    }

    #[test]
    fn parses_details_results() {
        let body = r#"{"ok": true, "result": {"content": [], "details": {"results": [{"title": "T", "url": "https://c.example.com"}]}}}"#;
        let records = parse_gateway_response(body, 10).expect("parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn ok_false_is_http_error() {
        let body = r#"{"ok": false, "error": {"type": "tool_error", "message": "brave api key missing"}}"#;
        let err = parse_gateway_response(body, 10).unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)));
        assert!(err.to_string().contains("brave api key missing"));
    }

    #[test]
    fn missing_results_is_malformed() {
        let err = parse_gateway_response(r#"{"ok": true, "result": {}}"#, 10).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
        let err = parse_gateway_response("not json", 10).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn respects_max_results() {
        let body = r#"{"results": [
            {"title": "A", "url": "https://a.com"},
            {"title": "B", "url": "https://b.com"}
        ]}"#;
        assert_eq!(parse_gateway_response(body, 1).expect("parse").len(), 1);
    }

    #[test]
    fn freshness_buckets() {
        assert_eq!(freshness_param(1), "pd");
        assert_eq!(freshness_param(7), "pw");
        assert_eq!(freshness_param(30), "pm");
        assert_eq!(freshness_param(90), "py");
    }

    #[test]
    fn count_is_clamped() {
        let args = WebSearchArgs {
            query: "q",
            count: 25usize.clamp(1, MAX_COUNT),
            freshness: None,
        };
        let json = serde_json::to_value(&args).expect("serialize");
        assert_eq!(json["count"], 10);
        assert!(json.get("freshness").is_none());
    }

    #[test]
    fn route_selection() {
        let client = reqwest::Client::new();

        let feed = GatewayProvider::new(&GatewayConfig::default(), client.clone()).expect("build");
        assert!(feed.uses_feed());

        let configured = GatewayConfig {
            url: Some("http://127.0.0.1:18789".into()),
            token: Some("tok".into()),
            ..Default::default()
        };
        let gateway = GatewayProvider::new(&configured, client.clone()).expect("build");
        assert!(!gateway.uses_feed());
    }

    #[tokio::test]
    async fn disabled_fallback_is_unavailable() {
        let config = GatewayConfig {
            feed_fallback: false,
            ..Default::default()
        };
        let provider = GatewayProvider::new(&config, reqwest::Client::new()).expect("build");
        let err = provider
            .search("acme", 5, &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
