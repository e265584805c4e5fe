//! Public news feed used as the keyless fallback of the gateway provider.
//!
//! Fetches a Google News style RSS search (`?q=..&hl=..&gl=..&ceid=..`) and
//! extracts `<item>` elements with regular expressions. Items carry `title`,
//! `link`, `pubDate` (RFC 2822), `source` and an HTML `description`.

use regex::Regex;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{ProviderError, SearchError};
use crate::http::FEED_USER_AGENT;
use crate::provider::{map_http_error, map_transport_error};
use crate::types::{parse_timestamp, ResultRecord};

use super::{decode_entities, strip_tags};

/// Record source label for feed results.
pub const NEWS_FEED: &str = "news-feed";

/// Compiled item and field patterns.
struct FeedPatterns {
    item: Regex,
    title: Regex,
    link: Regex,
    pub_date: Regex,
    source: Regex,
    description: Regex,
}

impl FeedPatterns {
    fn compile() -> Result<Self, regex::Error> {
        let field = |tag: &str| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}>"));
        Ok(Self {
            item: Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>")?,
            title: field("title")?,
            link: field("link")?,
            pub_date: field("pubDate")?,
            source: field("source")?,
            description: field("description")?,
        })
    }
}

/// Client for the public news RSS search.
pub struct NewsFeed {
    base_url: String,
    language: String,
    region: String,
    client: reqwest::Client,
    patterns: FeedPatterns,
}

impl NewsFeed {
    /// Build a feed client from the gateway settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `feed_url` is not a valid URL.
    pub fn new(config: &GatewayConfig, client: reqwest::Client) -> Result<Self, SearchError> {
        Url::parse(&config.feed_url)
            .map_err(|e| SearchError::Config(format!("invalid feed_url: {e}")))?;
        let patterns = FeedPatterns::compile()
            .map_err(|e| SearchError::Config(format!("feed patterns: {e}")))?;
        Ok(Self {
            base_url: config.feed_url.clone(),
            language: config.feed_language.clone(),
            region: config.feed_region.clone(),
            client,
            patterns,
        })
    }

    /// The feed search URL for `query`, narrowed with `when:Nd` when a
    /// freshness window is given.
    pub fn search_url(&self, query: &str, freshness_days: Option<u32>) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid feed url: {e}")))?;
        let q = match freshness_days {
            Some(days) => format!("{query} when:{days}d"),
            None => query.to_string(),
        };
        let lang = self.language.split('-').next().unwrap_or(&self.language);
        url.query_pairs_mut()
            .append_pair("q", &q)
            .append_pair("hl", &self.language)
            .append_pair("gl", &self.region)
            .append_pair("ceid", &format!("{}:{lang}", self.region));
        Ok(url)
    }

    /// Fetch up to `max_results` feed items for `query`.
    pub async fn fetch(
        &self,
        query: &str,
        max_results: usize,
        freshness_days: Option<u32>,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        let url = self.search_url(query, freshness_days)?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, FEED_USER_AGENT)
            .header("Accept", "application/rss+xml, application/xml;q=0.9, */*;q=0.8")
            .send()
            .await
            .map_err(|e| map_transport_error(NEWS_FEED, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(NEWS_FEED, &e))?;
        if !status.is_success() {
            return Err(map_http_error(NEWS_FEED, status, &body));
        }

        tracing::trace!(bytes = body.len(), "news feed response received");

        self.parse(&body, max_results)
    }

    /// Parse an RSS document into result records.
    fn parse(&self, xml: &str, max_results: usize) -> Result<Vec<ResultRecord>, ProviderError> {
        let p = &self.patterns;
        if !xml.contains("<rss") && !xml.contains("<channel") {
            return Err(ProviderError::Malformed("news feed is not an RSS document".into()));
        }

        let mut records = Vec::new();
        for item in p.item.captures_iter(xml) {
            if records.len() >= max_results {
                break;
            }
            let Some(body) = item.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let title = field_text(&p.title, body);
            let link = field_text(&p.link, body);
            if title.is_empty() || link.is_empty() {
                continue;
            }
            let description = strip_tags(&field_text(&p.description, body));
            let snippet = if description.is_empty() {
                field_text(&p.source, body)
            } else {
                description
            };
            records.push(ResultRecord {
                title,
                url: link,
                snippet,
                source: NEWS_FEED.to_string(),
                published_at: parse_timestamp(&field_text(&p.pub_date, body)),
            });
        }
        Ok(records)
    }
}

/// First match of `re` in `body`, trimmed. CDATA content is taken
/// literally; anything else has its entities decoded. Empty when the field is absent.
fn field_text(re: &Regex, body: &str) -> String {
    let Some(raw) = re.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str().trim()) else {
        return String::new();
    };
    match raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
    {
        Some(literal) => literal.trim().to_string(),
        None => decode_entities(raw).trim().to_string(),
    }
}
