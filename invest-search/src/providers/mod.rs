//! Search provider implementations.
//!
//! - [`TavilyProvider`] calls the direct search API.
//! - [`GatewayProvider`] reaches the secondary engine through the tool
//!   gateway, or the public news feed when no gateway is configured.

pub mod feed;
pub mod gateway;
pub mod tavily;

pub use feed::NewsFeed;
pub use gateway::GatewayProvider;
pub use tavily::TavilyProvider;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProviderKind, SearchConfig};
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;

/// Instantiate the configured providers in priority order.
///
/// All providers share one HTTP client bounded by `provider_timeout_ms`.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the HTTP client or a provider cannot be
/// built from `config`.
pub fn build_providers(config: &SearchConfig) -> Result<Vec<Arc<dyn SearchProvider>>, SearchError> {
    let client = http::build_client(
        Duration::from_millis(config.provider_timeout_ms),
        config.user_agent.as_deref(),
    )?;

    config
        .providers
        .iter()
        .map(|kind| -> Result<Arc<dyn SearchProvider>, SearchError> {
            Ok(match kind {
                ProviderKind::Tavily => {
                    Arc::new(TavilyProvider::new(config.tavily.clone(), client.clone()))
                }
                ProviderKind::Gateway => {
                    let gateway = GatewayProvider::new(&config.gateway, client.clone())?;
                    if gateway.uses_feed() {
                        tracing::info!("gateway not configured, answering from the news feed");
                    }
                    Arc::new(gateway)
                }
            })
        })
        .collect()
}

/// Remove markup tags, decode entities and collapse whitespace.
pub(crate) fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the XML predefined entities, `&nbsp;` and numeric references.
/// Unknown or unterminated entities are kept verbatim.
pub(crate) fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(end) = tail.find(';').filter(|&e| e <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
