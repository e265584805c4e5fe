//! Centralized application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! # Directory Layout
//!
//! | Purpose | Default |
//! |---------|---------|
//! | Config | `dirs::config_dir()/investment-assistant/` |
//!
//! The search cache root (`~/.investment-assistant/cache/`) is resolved by
//! [`invest_search::config::default_cache_root`].
//!
//! # Environment Overrides
//!
//! - `INVEST_ASSISTANT_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Environment variable overriding [`config_dir`].
pub const CONFIG_DIR_ENV: &str = "INVEST_ASSISTANT_CONFIG_DIR";

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/investment-assistant/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("investment-assistant"))
        .unwrap_or_else(|| PathBuf::from("/tmp/investment-assistant-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
