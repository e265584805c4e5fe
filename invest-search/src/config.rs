//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers are queried and in what
//! priority, provider credentials, timeouts, and the on-disk cache. It is
//! deserialisable so the host application can embed it as a `[search]`
//! table in its own config file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::SearchError;

/// Environment variable overriding the cache root directory.
pub const CACHE_DIR_ENV: &str = "INVEST_ASSISTANT_CACHE_DIR";

/// Default Tavily API endpoint.
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Default public news feed used when no gateway is configured.
pub const DEFAULT_FEED_URL: &str = "https://news.google.com/rss/search";

/// The provider implementations that can be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Direct search API (paid key).
    Tavily,
    /// Web search through the tool gateway, with a news-feed fallback.
    Gateway,
}

impl ProviderKind {
    /// Provider name used in logs, metadata and record sources.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tavily => "tavily",
            Self::Gateway => "gateway",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credentials and options for the direct search API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilyConfig {
    /// API key. `None` makes the provider permanently unavailable.
    pub api_key: Option<String>,
    /// API base URL (overridable for tests and proxies).
    pub base_url: String,
    /// Only return results from these domains.
    pub include_domains: Vec<String>,
    /// Never return results from these domains.
    pub exclude_domains: Vec<String>,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_TAVILY_BASE_URL.to_owned(),
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

impl fmt::Debug for TavilyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("include_domains", &self.include_domains)
            .field("exclude_domains", &self.exclude_domains)
            .finish()
    }
}

impl TavilyConfig {
    /// The API key, if one is set and non-blank.
    pub fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Gateway endpoint and news-feed fallback settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway base URL, e.g. `http://127.0.0.1:18789`.
    pub url: Option<String>,
    /// Bearer token for the gateway.
    pub token: Option<String>,
    /// Use the public news feed when the gateway is not configured.
    pub feed_fallback: bool,
    /// News feed search endpoint.
    pub feed_url: String,
    /// Feed interface language (`hl`), e.g. `en-US`.
    pub feed_language: String,
    /// Feed region (`gl`), e.g. `US`.
    pub feed_region: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            feed_fallback: true,
            feed_url: DEFAULT_FEED_URL.to_owned(),
            feed_language: "en-US".to_owned(),
            feed_region: "US".to_owned(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("feed_fallback", &self.feed_fallback)
            .field("feed_url", &self.feed_url)
            .field("feed_language", &self.feed_language)
            .field("feed_region", &self.feed_region)
            .finish()
    }
}

impl GatewayConfig {
    /// The `(url, token)` pair when both are set and non-blank.
    pub fn endpoint(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?;
        Some((url.trim_end_matches('/'), token))
    }
}

/// Configuration for the search manager and its providers.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Providers to query, in priority order. On URL collisions the record
    /// from the earlier provider wins.
    pub providers: Vec<ProviderKind>,
    /// Directory holding one JSON file per cached query.
    pub cache_dir: PathBuf,
    /// Cached entries older than this are ignored. `0` makes every entry stale.
    pub cache_ttl_seconds: u64,
    /// Per-provider request bound in milliseconds.
    pub provider_timeout_ms: u64,
    /// Bound on the whole fan-out in milliseconds.
    pub overall_timeout_ms: u64,
    /// User-Agent for API requests. `None` sends `invest-search/<version>`.
    pub user_agent: Option<String>,
    /// Direct search API settings.
    pub tavily: TavilyConfig,
    /// Gateway and feed fallback settings.
    pub gateway: GatewayConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::Tavily, ProviderKind::Gateway],
            cache_dir: default_cache_root().join("search"),
            cache_ttl_seconds: 12 * 3600,
            provider_timeout_ms: 20_000,
            overall_timeout_ms: 25_000,
            user_agent: None,
            tavily: TavilyConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `providers` must not be empty or contain duplicates
    /// - both timeouts must be greater than 0
    /// - `cache_dir` must not be empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        for (i, kind) in self.providers.iter().enumerate() {
            if self.providers[..i].contains(kind) {
                return Err(SearchError::Config(format!(
                    "provider {kind} is listed more than once"
                )));
            }
        }
        if self.provider_timeout_ms == 0 {
            return Err(SearchError::Config(
                "provider_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.overall_timeout_ms == 0 {
            return Err(SearchError::Config(
                "overall_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(SearchError::Config("cache_dir must not be empty".into()));
        }
        Ok(())
    }
}

/// Root of the user-local cache.
///
/// `$INVEST_ASSISTANT_CACHE_DIR` if set, else `~/.investment-assistant/cache`.
pub fn default_cache_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".investment-assistant").join("cache"))
        .unwrap_or_else(|| std::env::temp_dir().join("investment-assistant-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.cache_ttl_seconds, 43_200);
        assert_eq!(config.provider_timeout_ms, 20_000);
        assert_eq!(config.overall_timeout_ms, 25_000);
        assert!(config.user_agent.is_none());
        assert!(config.cache_dir.ends_with("search"));
        assert!(config.gateway.feed_fallback);
    }

    #[test]
    fn default_priority_is_direct_api_first() {
        let config = SearchConfig::default();
        assert_eq!(
            config.providers,
            vec![ProviderKind::Tavily, ProviderKind::Gateway]
        );
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_providers_rejected() {
        let config = SearchConfig {
            providers: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn duplicate_providers_rejected() {
        let config = SearchConfig {
            providers: vec![ProviderKind::Gateway, ProviderKind::Gateway],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = SearchConfig {
            provider_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("provider_timeout_ms"));

        let config = SearchConfig {
            overall_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("overall_timeout_ms"));
    }

    #[test]
    fn empty_cache_dir_rejected() {
        let config = SearchConfig {
            cache_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("cache_dir"));
    }

    #[test]
    fn blank_tavily_key_is_no_key() {
        let mut tavily = TavilyConfig::default();
        assert!(tavily.key().is_none());
        tavily.api_key = Some("   ".into());
        assert!(tavily.key().is_none());
        tavily.api_key = Some(" tvly-abc ".into());
        assert_eq!(tavily.key(), Some("tvly-abc"));
    }

    #[test]
    fn gateway_endpoint_requires_url_and_token() {
        let mut gateway = GatewayConfig::default();
        assert!(gateway.endpoint().is_none());
        gateway.url = Some("http://127.0.0.1:18789/".into());
        assert!(gateway.endpoint().is_none());
        gateway.token = Some("tok".into());
        assert_eq!(gateway.endpoint(), Some(("http://127.0.0.1:18789", "tok")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = SearchConfig {
            tavily: TavilyConfig {
                api_key: Some("tvly-secret".into()),
                ..Default::default()
            },
            gateway: GatewayConfig {
                token: Some("gw-secret".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("tvly-secret"));
        assert!(!debug.contains("gw-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn deserialises_partial_json_with_defaults() {
        let json = r#"{"providers": ["gateway"], "tavily": {"api_key": "k"}}"#;
        let config: SearchConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.providers, vec![ProviderKind::Gateway]);
        assert_eq!(config.tavily.key(), Some("k"));
        assert_eq!(config.tavily.base_url, DEFAULT_TAVILY_BASE_URL);
        assert_eq!(config.cache_ttl_seconds, 43_200);
    }

    #[test]
    fn provider_kind_names() {
        assert_eq!(ProviderKind::Tavily.to_string(), "tavily");
        assert_eq!(ProviderKind::Gateway.name(), "gateway");
    }
}
