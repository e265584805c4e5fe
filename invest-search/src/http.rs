//! Shared HTTP client for provider requests.
//!
//! API calls identify themselves as `invest-search/<version>`. The public
//! news feed serves bot User-Agents an interstitial page, so the feed sets
//! [`FEED_USER_AGENT`] on its own requests.

use crate::error::SearchError;
use std::time::Duration;

/// User-Agent sent to authenticated APIs when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("invest-search/", env!("CARGO_PKG_VERSION"));

/// Browser User-Agent for the public news feed.
pub const FEED_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0";

/// Build the client shared by all providers.
///
/// `timeout` bounds every request; `user_agent` replaces
/// [`DEFAULT_USER_AGENT`] when set.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}
