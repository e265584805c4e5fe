//! Trait definition for pluggable search providers.
//!
//! Each backend (the direct search API, the tool gateway) implements
//! [`SearchProvider`] so the manager can fan out to any configured set of
//! providers through one interface.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{ProviderHits, SearchOptions};

/// A pluggable search backend.
///
/// Implementors own their credentials and HTTP client and translate the
/// backend's response into [`crate::ResultRecord`] values. Each provider
/// handles its own:
///
/// - request construction and authentication
/// - response parsing and record normalisation (trimmed fields, no empty
///   titles or URLs)
/// - classification of failures into [`ProviderError`] variants
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable provider name used in logs and search metadata.
    fn name(&self) -> &str;

    /// Run one query and return up to `max_results` records.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] without any network traffic when
    /// the provider is not configured, and [`ProviderError::Http`],
    /// [`ProviderError::Timeout`] or [`ProviderError::Malformed`] for failed
    /// requests.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        options: &SearchOptions,
    ) -> Result<ProviderHits, ProviderError>;
}

/// Map a reqwest transport error onto a provider failure.
pub(crate) fn map_transport_error(provider: &str, err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(format!("{provider} request timed out"))
    } else {
        ProviderError::Http(format!("{provider} request failed: {err}"))
    }
}

/// Map a non-2xx response onto a provider failure.
pub(crate) fn map_http_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> ProviderError {
    let detail = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ProviderError::Http(format!("{provider} authentication failed: {detail}")),
        429 => ProviderError::Http(format!("{provider} rate limited: {detail}")),
        408 | 504 => ProviderError::Timeout(format!("{provider} HTTP {}: {detail}", status.as_u16())),
        s => ProviderError::Http(format!("{provider} HTTP {s}: {detail}")),
    }
}

/// Extract a human-readable error message from a JSON error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["/error/message", "/detail/error", "/error", "/message", "/detail"]
                .iter()
                .find_map(|ptr| v.pointer(ptr).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "no response body".to_string()
            } else {
                body.chars().take(300).collect()
            }
        })
}
