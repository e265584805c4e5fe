//! Investment assistant: news retrieval for research prompts.
//!
//! This crate is the consuming side of [`invest_search`]:
//! - **Config**: `config.toml` plus environment credentials ([`AppConfig`])
//! - **Directories**: platform config file location ([`app_dirs`])
//! - **News**: [`NewsCollector`] wraps union searches into the stable
//!   `{news, search_metadata}` report
//!
//! The `invest-news` binary drives the collector from the command line.

pub mod app_dirs;
pub mod config;
pub mod error;
pub mod news;

pub use config::{AppConfig, NewsConfig};
pub use error::{AssistantError, Result};
pub use news::{FailedDimension, NewsCollector, NewsItem, NewsReport, SearchMetadata};
