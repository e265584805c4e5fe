//! Cache identity for a search request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::SearchRequest;

/// SHA-256 hex digest identifying a normalised search request.
///
/// Two requests share a fingerprint when their queries are equal after
/// trimming, lower-casing and whitespace collapsing, and their result count,
/// topic, depth and freshness window match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Canonical hashed form. Field order is fixed by the struct definition.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    q: &'a str,
    p: &'static str,
    n: usize,
    topic: &'static str,
    depth: &'static str,
    days: Option<u32>,
}

impl Fingerprint {
    /// Fingerprint of the merged (all-provider) result for `request`.
    pub fn of(request: &SearchRequest) -> Self {
        let query = request.normalized_query();
        let input = FingerprintInput {
            q: &query,
            p: "union",
            n: request.max_results,
            topic: request.options.topic.as_str(),
            depth: request.options.depth.as_str(),
            days: request.options.freshness_days,
        };
        // Serialising a struct of strings and integers cannot fail.
        let canonical = serde_json::to_string(&input).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Parse a 64-character lower-case hex string, e.g. a cache file stem.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == 64
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
