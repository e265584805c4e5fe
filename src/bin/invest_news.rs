//! CLI binary for news collection.

use clap::{Parser, Subcommand};
use invest_assistant::{app_dirs, AppConfig, NewsCollector};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Collect investment news across all configured search providers.
#[derive(Parser)]
#[command(name = "invest-news", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search news for a free-form query and print the report as JSON.
    Search {
        /// Query text.
        query: String,

        /// Maximum number of items.
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Collect news about a stock and its related entities.
    Stock {
        /// Stock name or ticker.
        name: String,

        /// Related entity (repeatable).
        #[arg(short, long = "entity")]
        entities: Vec<String>,

        /// Freshness window in days.
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Print a prompt-ready digest instead of JSON.
    Digest {
        /// Query text.
        query: String,

        /// Number of items to render.
        #[arg(short, long, default_value_t = 8)]
        limit: usize,
    },

    /// Remove stale and corrupt cache entries.
    Sweep,

    /// Write a default config file if none exists.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("invest_assistant=info,invest_search=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Init = cli.command {
        let path = cli.config.unwrap_or_else(app_dirs::config_file);
        if path.exists() {
            println!("config already exists at {}", path.display());
        } else {
            AppConfig::default().save_to_file(&path)?;
            println!("wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let config = match cli.config {
        Some(ref path) => {
            let mut config = AppConfig::from_file(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
        None => AppConfig::load()?,
    };

    let collector = NewsCollector::new(&config)?;

    match cli.command {
        Command::Search { query, max } => {
            let report = collector.collect_news(&query, max).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stock {
            name,
            entities,
            days,
        } => {
            let report = collector.collect_for_stock(&name, &entities, days).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Digest { query, limit } => {
            let report = collector.collect_news(&query, Some(limit)).await?;
            for warning in &report.search_metadata.search_warnings {
                tracing::warn!("{warning}");
            }
            println!("{}", report.prompt_digest(limit));
        }
        Command::Sweep => {
            let removed = collector.manager().sweep_cache().await?;
            tracing::info!(removed, "cache sweep complete");
            println!("removed {removed} cache entries");
        }
        Command::Init => {}
    }

    Ok(())
}
