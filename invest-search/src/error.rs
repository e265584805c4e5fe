//! Error types for the invest-search crate.
//!
//! Three layers of failure exist and only one of them ever reaches callers:
//!
//! - [`SearchError`]: rejected input or configuration. The only error a
//!   caller of [`crate::SearchManager::union_search`] can observe.
//! - [`ProviderError`]: a single provider failed. Always recovered inside the
//!   manager and reported as metadata.
//! - [`CacheError`]: the on-disk cache could not be read or written. Logged
//!   and treated as a miss (reads) or skipped (writes).
//!
//! No API keys or gateway tokens appear in error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors surfaced to callers of the search layer.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The query or result budget was rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for invest-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

/// A failure of one provider for one query.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// No credential or endpoint is configured; no request was made.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider did not answer within its deadline.
    #[error("provider timed out: {0}")]
    Timeout(String),

    /// Transport failure or non-2xx response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response arrived but could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Coarse failure classification used in search metadata.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable(_) => FailureKind::Unavailable,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Http(_) | Self::Malformed(_) => FailureKind::Error,
        }
    }
}

/// Coarse provider failure kind, stable for downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing credential or configuration.
    Unavailable,
    /// Per-provider or overall deadline exceeded.
    Timeout,
    /// Non-2xx, transport or malformed response.
    Error,
}

impl FailureKind {
    /// Lower-case label used in `providers_failed_with_reason`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the on-disk cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem failure.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialised.
    #[error("cache serialise error: {0}")]
    Serialize(String),

    /// An entry exists but cannot be decoded.
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}
