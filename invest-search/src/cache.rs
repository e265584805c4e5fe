//! On-disk cache of merged search results.
//!
//! One pretty-printed JSON file per fingerprint under the cache directory:
//! `<cache_dir>/<fingerprint>.json`. Reads never fail and never delete:
//! missing, corrupt and stale entries are all misses. Stale and corrupt
//! files are only removed by [`CacheStore::sweep_stale`].
//!
//! Writes go to a unique temporary file that is renamed over the target, so
//! concurrent writers of the same fingerprint resolve to last-writer-wins
//! without readers ever seeing a torn file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::orchestrator::fingerprint::Fingerprint;
use crate::types::ResultRecord;

/// A persisted snapshot of one merged search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Identity of the request this entry answers.
    pub fingerprint: Fingerprint,
    /// Normalised query text, kept for inspection.
    pub query: String,
    /// Merged, deduplicated records.
    pub records: Vec<ResultRecord>,
    /// When the records were fetched from providers.
    pub created_at: DateTime<Utc>,
    /// Providers whose answers the records were built from.
    #[serde(default)]
    pub providers_used: Vec<String>,
    /// Contributing providers that answered from a fallback source.
    #[serde(default)]
    pub degraded_providers: Vec<String>,
}

/// File-backed cache keyed by [`Fingerprint`].
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    ttl_seconds: u64,
}

impl CacheStore {
    /// A store rooted at `dir`. Nothing touches the filesystem until the
    /// first [`put`](Self::put).
    pub fn new(dir: impl Into<PathBuf>, ttl_seconds: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_seconds,
        }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry file for `fingerprint`.
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    /// Create the cache directory if needed. Idempotent.
    pub async fn ensure_dir(&self) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Whether an entry created at `created_at` is past the TTL at `now`.
    pub fn is_stale(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.ttl_seconds == 0 {
            return true;
        }
        let age_ms = (now - created_at).num_milliseconds();
        let ttl_ms = i64::try_from(self.ttl_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        age_ms > ttl_ms
    }

    /// Fetch a fresh entry for `fingerprint`, or `None`.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let path = self.entry_path(fingerprint);
        let entry = match read_entry(&path).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(fingerprint = %fingerprint, error = %err, "unreadable cache entry, treating as miss");
                return None;
            }
        };

        if entry.fingerprint != *fingerprint {
            tracing::warn!(fingerprint = %fingerprint, "cache entry fingerprint mismatch, treating as miss");
            return None;
        }

        if self.is_stale(entry.created_at, Utc::now()) {
            tracing::debug!(fingerprint = %fingerprint, created_at = %entry.created_at, "stale cache entry ignored");
            return None;
        }

        Some(entry)
    }

    /// Store freshly merged records for `fingerprint`, stamped now.
    pub async fn put(
        &self,
        fingerprint: &Fingerprint,
        query: &str,
        records: &[ResultRecord],
        providers_used: &[String],
        degraded_providers: &[String],
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            query: query.to_string(),
            records: records.to_vec(),
            created_at: Utc::now(),
            providers_used: providers_used.to_vec(),
            degraded_providers: degraded_providers.to_vec(),
        };
        self.put_entry(&entry).await
    }

    /// Store a complete entry at the path derived from its fingerprint.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.ensure_dir().await?;

        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| CacheError::Serialize(e.to_string()))?;

        let target = self.entry_path(&entry.fingerprint);
        let tmp = self.dir.join(format!(
            ".{}.{:016x}.tmp",
            entry.fingerprint,
            rand::random::<u64>()
        ));

        tokio::fs::write(&tmp, json.as_bytes()).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        tracing::debug!(fingerprint = %entry.fingerprint, records = entry.records.len(), "cache entry written");
        Ok(())
    }

    /// Delete stale and corrupt entries. Returns how many files were removed.
    ///
    /// A missing cache directory is not an error. Files that are not named
    /// like cache entries are left alone.
    pub async fn sweep_stale(&self) -> Result<usize, CacheError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let now = Utc::now();
        let mut removed = 0;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_entry = path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Fingerprint::from_hex)
                    .is_some();
            if !is_entry {
                continue;
            }

            let remove = match read_entry(&path).await {
                Ok(Some(entry)) => self.is_stale(entry.created_at, now),
                Ok(None) => false,
                Err(CacheError::Corrupt(_)) => true,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable cache entry");
                    false
                }
            };

            if remove {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        tracing::debug!(removed, dir = %self.dir.display(), "cache sweep finished");
        Ok(removed)
    }
}

/// Read and decode one entry file. `Ok(None)` when it does not exist.
async fn read_entry(path: &Path) -> Result<Option<CacheEntry>, CacheError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| CacheError::Corrupt(format!("{}: {e}", path.display())))
}
