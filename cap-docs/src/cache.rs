//! `ExternalDocsCache`: a two-tier, content-addressed TTL+LRU cache for
//! external-library documentation lookups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cap_core::ContextItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::DocsCacheResult;
use crate::stats::{CacheStats, StatsInner};

/// Entries older than this are treated as a miss and evicted on read.
pub const DEFAULT_TTL_SECS: i64 = 3600;
/// Eviction policy kicks in once the index grows past this many entries.
pub const MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    library_id: String,
    query: String,
    cached_at: DateTime<Utc>,
    item_count: usize,
}

fn cache_key(library_id: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(library_id.as_bytes());
    hasher.update(b":");
    hasher.update(query.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

/// File-backed cache rooted at `<cache_dir>/{index.json, data/<16-hex>.json}`.
///
/// Index and data are kept eventually consistent: a missing data file for
/// an indexed key, or corrupt JSON on read, is treated as a miss and the
/// index entry is removed in the same operation.
pub struct ExternalDocsCache {
    cache_dir: PathBuf,
    data_dir: PathBuf,
    ttl_secs: i64,
    max_entries: usize,
    index: RwLock<BTreeMap<String, IndexEntry>>,
    stats: StatsInner,
}

impl ExternalDocsCache {
    pub async fn new(cache_dir: impl Into<PathBuf>) -> DocsCacheResult<Self> {
        Self::with_ttl(cache_dir, DEFAULT_TTL_SECS, MAX_ENTRIES).await
    }

    pub async fn with_ttl(cache_dir: impl Into<PathBuf>, ttl_secs: i64, max_entries: usize) -> DocsCacheResult<Self> {
        let cache_dir = cache_dir.into();
        let data_dir = cache_dir.join("data");
        tokio::fs::create_dir_all(&data_dir).await?;

        let index = load_index(&cache_dir.join("index.json")).await;

        Ok(Self {
            cache_dir,
            data_dir,
            ttl_secs,
            max_entries,
            index: RwLock::new(index),
            stats: StatsInner::default(),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.cache_dir.join("index.json")
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    /// `get(library_id, query) → ContextItem[] | null`
    pub async fn get(&self, library_id: &str, query: &str) -> Option<Vec<ContextItem>> {
        let key = cache_key(library_id, query);

        let entry = {
            let index = self.index.read().await;
            index.get(&key).cloned()
        };
        let Some(entry) = entry else {
            self.stats.record_miss();
            return None;
        };

        let age_seconds = (Utc::now() - entry.cached_at).num_seconds();
        if age_seconds >= self.ttl_secs {
            tracing::debug!(key, "external-docs cache entry expired");
            self.remove(&key).await;
            self.stats.record_miss();
            return None;
        }

        match tokio::fs::read(self.data_path(&key)).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<ContextItem>>(&bytes) {
                Ok(items) => {
                    self.stats.record_hit();
                    Some(items)
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "corrupt external-docs cache entry, evicting");
                    self.remove(&key).await;
                    self.stats.record_miss();
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "external-docs cache index/data mismatch, evicting");
                self.remove(&key).await;
                self.stats.record_miss();
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read external-docs cache entry");
                self.stats.record_miss();
                None
            }
        }
    }

    /// `set(library_id, query, items)`
    pub async fn set(&self, library_id: &str, query: &str, items: &[ContextItem]) -> DocsCacheResult<()> {
        let key = cache_key(library_id, query);
        let body = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(self.data_path(&key), body).await?;

        let evict_keys = {
            let mut index = self.index.write().await;
            index.insert(
                key.clone(),
                IndexEntry {
                    library_id: library_id.to_string(),
                    query: query.to_string(),
                    cached_at: Utc::now(),
                    item_count: items.len(),
                },
            );

            if index.len() > self.max_entries {
                oldest_keys(&index, index.len() / 10)
            } else {
                Vec::new()
            }
        };
        self.save_index().await?;

        for key in evict_keys {
            self.remove(&key).await;
            self.stats.record_eviction();
        }
        tracing::debug!(library_id, query, "cached external-docs entry");
        Ok(())
    }

    /// Clear every cached entry.
    pub async fn clear(&self) -> DocsCacheResult<()> {
        let keys: Vec<String> = {
            let index = self.index.read().await;
            index.keys().cloned().collect()
        };
        for key in keys {
            self.remove(&key).await;
        }
        Ok(())
    }

    pub async fn stats(&self) -> CacheStats {
        let entry_count = self.index.read().await.len();
        self.stats.snapshot(entry_count)
    }

    async fn remove(&self, key: &str) {
        {
            let mut index = self.index.write().await;
            index.remove(key);
        }
        let _ = self.save_index().await;
        let _ = tokio::fs::remove_file(self.data_path(key)).await;
    }

    async fn save_index(&self) -> DocsCacheResult<()> {
        let index = self.index.read().await;
        let body = serde_json::to_vec_pretty(&*index)?;
        tokio::fs::write(self.index_path(), body).await?;
        Ok(())
    }
}

fn oldest_keys(index: &BTreeMap<String, IndexEntry>, count: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &IndexEntry)> = index.iter().collect();
    entries.sort_by_key(|(_, entry)| entry.cached_at);
    entries
        .into_iter()
        .take(count.max(1))
        .map(|(key, _)| key.clone())
        .collect()
}

async fn load_index(path: &Path) -> BTreeMap<String, IndexEntry> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_core::Source;
    use std::collections::BTreeMap as Map;

    fn item(id: &str) -> ContextItem {
        ContextItem::new(id, Source::Context7, "title", "summary", None, 0.7, 0.0, Map::new()).unwrap()
    }

    #[tokio::test]
    async fn set_then_get_round_trips_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::new(dir.path()).await.unwrap();
        cache.set("/facebook/react", "hooks", &[item("a")]).await.unwrap();

        let found = cache.get("/facebook/react", "hooks").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::with_ttl(dir.path(), 0, MAX_ENTRIES).await.unwrap();
        cache.set("/facebook/react", "hooks", &[item("a")]).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(cache.get("/facebook/react", "hooks").await.is_none());
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn missing_data_file_self_heals_index() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::new(dir.path()).await.unwrap();
        cache.set("/facebook/react", "hooks", &[item("a")]).await.unwrap();

        let key = cache_key("/facebook/react", "hooks");
        tokio::fs::remove_file(cache.data_path(&key)).await.unwrap();

        assert!(cache.get("/facebook/react", "hooks").await.is_none());
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn corrupt_data_file_is_treated_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::new(dir.path()).await.unwrap();
        cache.set("/facebook/react", "hooks", &[item("a")]).await.unwrap();

        let key = cache_key("/facebook/react", "hooks");
        tokio::fs::write(cache.data_path(&key), b"not json").await.unwrap();

        assert!(cache.get("/facebook/react", "hooks").await.is_none());
    }

    #[tokio::test]
    async fn eviction_removes_oldest_tenth_past_max_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::with_ttl(dir.path(), DEFAULT_TTL_SECS, 10).await.unwrap();
        for i in 0..11 {
            cache.set("lib", &format!("q{i}"), &[item("a")]).await.unwrap();
        }
        let stats = cache.stats().await;
        assert!(stats.entry_count <= 10);
        assert!(stats.evictions >= 1);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExternalDocsCache::new(dir.path()).await.unwrap();
        cache.set("lib", "q", &[item("a")]).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await.entry_count, 0);
    }
}
