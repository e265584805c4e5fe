//! Application configuration loaded from `config.toml`.
//!
//! ```toml
//! [search]
//! providers = ["tavily", "gateway"]
//! cache_ttl_seconds = 43200
//!
//! [search.tavily]
//! api_key = "tvly-..."
//!
//! [search.gateway]
//! url = "http://127.0.0.1:18789"
//!
//! [news]
//! default_max_results = 8
//! ```
//!
//! Credentials may instead come from the environment; see
//! [`AppConfig::apply_env_overrides`].

use std::path::{Path, PathBuf};

use invest_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::app_dirs;
use crate::error::{AssistantError, Result};

/// Direct search API key.
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
/// Tool gateway base URL.
pub const GATEWAY_URL_ENV: &str = "INVEST_GATEWAY_URL";
/// Tool gateway bearer token.
pub const GATEWAY_TOKEN_ENV: &str = "INVEST_GATEWAY_TOKEN";
/// Cache root; the search cache lives in its `search/` subdirectory.
pub const CACHE_DIR_ENV: &str = invest_search::config::CACHE_DIR_ENV;

/// News collection defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Result budget per query when the caller gives none.
    pub default_max_results: usize,
    /// Freshness window for stock news.
    pub default_time_range_days: u32,
    /// Related entities searched alongside the stock itself.
    pub max_related_entities: usize,
    /// Cap on items in a multi-dimension report.
    pub max_total_items: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            default_max_results: 8,
            default_time_range_days: 7,
            max_related_entities: 3,
            max_total_items: 20,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search layer settings.
    pub search: SearchConfig,
    /// News collection settings.
    pub news: NewsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AssistantError::Config(e.to_string()))
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::from_file(path) {
            Err(AssistantError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Load `config_dir()/config.toml` (or defaults), apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or the result is invalid.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_or_default(&app_dirs::config_file())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// The file is written next to its destination and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AssistantError::Config(e.to_string()))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Overlay credentials and the cache location from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production. Blank values are
    /// ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(TAVILY_API_KEY_ENV) {
            self.search.tavily.api_key = Some(key);
        }
        if let Some(url) = get(GATEWAY_URL_ENV) {
            self.search.gateway.url = Some(url);
        }
        if let Some(token) = get(GATEWAY_TOKEN_ENV) {
            self.search.gateway.token = Some(token);
        }
        if let Some(dir) = get(CACHE_DIR_ENV) {
            self.search.cache_dir = PathBuf::from(dir).join("search");
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Search`] for invalid search settings and
    /// [`AssistantError::Config`] for invalid news settings.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.news.default_max_results == 0 {
            return Err(AssistantError::Config(
                "news.default_max_results must be greater than 0".into(),
            ));
        }
        if self.news.default_time_range_days == 0 {
            return Err(AssistantError::Config(
                "news.default_time_range_days must be greater than 0".into(),
            ));
        }
        if self.news.max_total_items == 0 {
            return Err(AssistantError::Config(
                "news.max_total_items must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
