//! Error types for the investment assistant.

use invest_search::SearchError;

/// Top-level error type for config loading and news collection.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Configuration could not be parsed, serialised or validated.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The search layer rejected the request or its configuration.
    #[error("search error: {0}")]
    Search(#[from] SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
