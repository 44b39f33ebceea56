//! # SummaryCache
//!
//! Durable product-name → review-summary cache.
//!
//! Summaries are expensive to generate (one chat-model call per product), so
//! Aisle keeps them in a JSON file keyed by a content-addressed hash of the
//! product name. The cache is a performance optimization, never a correctness
//! dependency: every I/O failure degrades to cache-miss behavior and is
//! logged, not propagated.
//!
//! ## Durability
//! Every persist writes the full snapshot to a fresh temp file in the cache
//! directory, then atomically renames it over the durable path. The prior
//! snapshot is copied to `<path>.bak` first and only removed once the swap
//! succeeds, so a crash at any point leaves either the old contents or the
//! new contents on disk — never a torn file. Readers during a write see one
//! or the other for the same reason. Concurrent writers are out of scope
//! (single-writer assumption).
//!
//! ## Keys
//! Product names are lowercased and trimmed before hashing, so cosmetic name
//! variations collide to the same entry. The hash only needs stability across
//! restarts and a low collision probability.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// One cached summary plus its bookkeeping timestamps.
///
/// Timestamps are RFC 3339 strings. An entry whose `last_accessed` cannot be
/// parsed is treated as maximally old by eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Product name as last written (pre-normalization).
    pub product_name: String,
    /// The generated review summary.
    pub summary: String,
    /// Set on first insert, never changed afterwards.
    pub created_at: String,
    /// Refreshed on every read hit and every write.
    pub last_accessed: String,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub file_size_bytes: u64,
    pub file_exists: bool,
}

/// Durable mapping from product identity to generated summary text.
pub struct SummaryCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl SummaryCache {
    /// Open a cache backed by the JSON file at `path`.
    ///
    /// Loads the primary file, falls back to the `.bak` snapshot when the
    /// primary is missing or corrupt, and starts empty when neither is
    /// readable. Never fails: an unreadable store is a cold cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_entries(&path);
        Self { path, entries }
    }

    fn load_entries(path: &Path) -> HashMap<String, CacheEntry> {
        match Self::read_snapshot(path) {
            Ok(entries) => entries,
            Err(primary_err) => {
                let backup = Self::backup_path(path);
                match Self::read_snapshot(&backup) {
                    Ok(entries) => {
                        warn!(
                            "summary cache recovered from backup snapshot {}: {primary_err}",
                            backup.display()
                        );
                        entries
                    }
                    Err(_) => {
                        if path.exists() {
                            warn!("summary cache unreadable, starting empty: {primary_err}");
                        }
                        HashMap::new()
                    }
                }
            }
        }
    }

    fn read_snapshot(path: &Path) -> io::Result<HashMap<String, CacheEntry>> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        PathBuf::from(backup)
    }

    /// Deterministic content-addressed key for a product name.
    ///
    /// Lowercase + trim before hashing, stable across process restarts.
    pub fn key_for(product_name: &str) -> String {
        sha256::digest(product_name.trim().to_lowercase())
    }

    /// Look up the cached summary for a product.
    ///
    /// A hit refreshes the entry's `last_accessed` timestamp.
    pub fn get(&mut self, product_name: &str) -> Option<String> {
        let entry = self.entries.get_mut(&Self::key_for(product_name))?;
        entry.last_accessed = Utc::now().to_rfc3339();
        Some(entry.summary.clone())
    }

    /// Insert or update the summary for a product and persist the cache.
    ///
    /// `created_at` is set on first insert only; `last_accessed` always
    /// refreshes. A persist failure is logged and swallowed — the entry stays
    /// usable in memory and the next successful persist will carry it.
    pub fn put(&mut self, product_name: &str, summary: &str) {
        let now = Utc::now().to_rfc3339();
        match self.entries.entry(Self::key_for(product_name)) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.product_name = product_name.to_string();
                entry.summary = summary.to_string();
                entry.last_accessed = now;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    product_name: product_name.to_string(),
                    summary: summary.to_string(),
                    created_at: now.clone(),
                    last_accessed: now,
                });
            }
        }

        if let Err(e) = self.persist() {
            warn!("summary cache write failed, continuing uncached: {e}");
        }
    }

    /// Remove entries whose `last_accessed` predates the retention window.
    ///
    /// Entries with missing or unparseable timestamps are evicted. Returns
    /// the number of entries removed; persists only when something was.
    pub fn evict_older_than(&mut self, retention: Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| match DateTime::parse_from_rfc3339(&entry.last_accessed) {
                Ok(ts) => ts.with_timezone(&Utc) >= cutoff,
                Err(_) => false,
            });
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!("evicted {removed} stale summary cache entries");
            if let Err(e) = self.persist() {
                warn!("summary cache write failed after eviction: {e}");
            }
        }
        removed
    }

    /// Drop every entry and delete the durable files.
    pub fn clear(&mut self) {
        self.entries.clear();
        for path in [self.path.clone(), Self::backup_path(&self.path)] {
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("failed to remove {}: {e}", path.display());
                }
            }
        }
    }

    /// Entry count and on-disk footprint.
    pub fn stats(&self) -> CacheStats {
        let metadata = fs::metadata(&self.path);
        CacheStats {
            total_entries: self.entries.len(),
            file_size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            file_exists: metadata.is_ok(),
        }
    }

    /// Number of cached summaries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no summaries are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the full snapshot durably: temp file, atomic rename, backup of
    /// the prior snapshot retained until the swap succeeds.
    fn persist(&self) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let backup = Self::backup_path(&self.path);
        if self.path.exists() {
            fs::copy(&self.path, &backup)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(json.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;

        if backup.exists() {
            let _ = fs::remove_file(&backup);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &Path) -> SummaryCache {
        SummaryCache::open(dir.join("product_summaries.json"))
    }

    #[test]
    fn round_trips_summaries_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());

        let summary = "Loved for the fit; a few reviewers flagged thin fabric: é, ñ, 中文";
        cache.put("Test Product ABC 123", summary);
        assert_eq!(cache.get("Test Product ABC 123").as_deref(), Some(summary));
    }

    #[test]
    fn names_normalize_to_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());

        cache.put("  Linen Shirt ", "first");
        cache.put("LINEN SHIRT", "second");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("linen shirt").as_deref(), Some("second"));
    }

    #[test]
    fn created_at_survives_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());

        cache.put("Linen Shirt", "first");
        let key = SummaryCache::key_for("Linen Shirt");
        let created = cache.entries[&key].created_at.clone();

        cache.put("Linen Shirt", "second");
        assert_eq!(cache.entries[&key].created_at, created);
        assert_eq!(cache.entries[&key].summary, "second");
    }

    #[test]
    fn reopens_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = cache_in(dir.path());
            cache.put("Linen Shirt", "durable summary");
        }
        let mut reopened = cache_in(dir.path());
        assert_eq!(
            reopened.get("Linen Shirt").as_deref(),
            Some("durable summary")
        );
    }

    #[test]
    fn interrupted_persist_leaves_prior_contents_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product_summaries.json");
        {
            let mut cache = SummaryCache::open(&path);
            cache.put("Linen Shirt", "pre-crash summary");
        }

        // A crash after staging but before the atomic swap leaves a stray
        // temp file and possibly a backup copy; the primary is untouched.
        fs::write(dir.path().join(".tmpXYZ123"), "{\"trunca").unwrap();
        fs::copy(&path, dir.path().join("product_summaries.json.bak")).unwrap();

        let mut reopened = SummaryCache::open(&path);
        assert_eq!(
            reopened.get("Linen Shirt").as_deref(),
            Some("pre-crash summary")
        );
    }

    #[test]
    fn corrupt_primary_recovers_from_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product_summaries.json");
        {
            let mut cache = SummaryCache::open(&path);
            cache.put("Linen Shirt", "backed-up summary");
        }
        fs::copy(&path, dir.path().join("product_summaries.json.bak")).unwrap();
        fs::write(&path, "{ definitely not json").unwrap();

        let mut recovered = SummaryCache::open(&path);
        assert_eq!(
            recovered.get("Linen Shirt").as_deref(),
            Some("backed-up summary")
        );
    }

    #[test]
    fn write_failure_degrades_to_memory_only() {
        let dir = tempfile::tempdir().unwrap();
        // The cache path is a directory, so the atomic swap can never succeed.
        let mut cache = SummaryCache::open(dir.path());

        cache.put("Linen Shirt", "memory only");
        assert_eq!(cache.get("Linen Shirt").as_deref(), Some("memory only"));
    }

    #[test]
    fn eviction_honors_the_retention_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());

        cache.put("Fresh Pick", "kept");
        cache.put("Stale Pick", "dropped");
        cache.put("Broken Clock", "dropped");
        let stale_key = SummaryCache::key_for("Stale Pick");
        cache.entries.get_mut(&stale_key).unwrap().last_accessed =
            (Utc::now() - Duration::days(60)).to_rfc3339();
        let broken_key = SummaryCache::key_for("Broken Clock");
        cache.entries.get_mut(&broken_key).unwrap().last_accessed = "not-a-timestamp".to_string();

        let removed = cache.evict_older_than(Duration::days(30));

        assert_eq!(removed, 2);
        assert!(cache.get("Fresh Pick").is_some());
        assert!(cache.get("Stale Pick").is_none());
        assert!(cache.get("Broken Clock").is_none());

        // Eviction persisted: a reopen agrees.
        let mut reopened = cache_in(dir.path());
        assert!(reopened.get("Fresh Pick").is_some());
        assert!(reopened.get("Stale Pick").is_none());
    }

    #[test]
    fn clear_removes_entries_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());
        cache.put("Linen Shirt", "summary");
        assert!(cache.stats().file_exists);

        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.stats().file_exists);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn stats_reports_entries_and_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_in(dir.path());
        cache.put("Linen Shirt", "summary");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert!(stats.file_exists);
        assert!(stats.file_size_bytes > 0);
    }
}
