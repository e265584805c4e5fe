//! URL canonicalisation for cross-provider deduplication.
//!
//! The same article reached through two providers often differs only in
//! tracking parameters, parameter order, a fragment, a trailing slash,
//! a default port or letter case. [`normalize_url`] maps those variants onto
//! one comparison key.

use url::Url;

/// Query parameters that never identify content.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "dclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "ref",
    "ref_src",
    "si",
    "feature",
];

/// Build the comparison key for `raw`.
///
/// 1. Scheme, host and path are lower-cased.
/// 2. Default ports (`:80`, `:443`) are dropped.
/// 3. The fragment is removed.
/// 4. `utm_*` and other tracking parameters are removed; the rest are sorted.
/// 5. A trailing slash is removed from any path longer than `/`.
///
/// Inputs that do not parse as absolute URLs are trimmed and lower-cased.
///
/// ```
/// use invest_search::orchestrator::url_normalize::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://News.Example.com:443/Markets/ACME/?utm_source=x&b=2&a=1#top"),
///     normalize_url("https://news.example.com/markets/acme?a=1&b=2"),
/// );
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    url.set_fragment(None);

    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = url.set_port(None);
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    let mut path = url.path().to_lowercase();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    url.set_path(&path);

    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
