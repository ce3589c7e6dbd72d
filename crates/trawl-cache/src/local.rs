//! In-process fallback cache backend (spec §4.9): a plain map with
//! per-entry `expires_at` checked on read. No eviction policy beyond
//! expiry — the spec describes no capacity bound for the local fallback.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use trawl_types::ports::CacheBackend;
use trawl_types::Result;

struct LocalEntry {
    value: Vec<u8>,
    expires_at_ms: Option<i64>,
}

#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, LocalEntry>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired(entry: &LocalEntry) -> bool {
        entry
            .expires_at_ms
            .is_some_and(|exp| Utc::now().timestamp_millis() >= exp)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if Self::is_expired(&entry) {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) -> Result<()> {
        let expires_at_ms = ttl_secs.map(|s| Utc::now().timestamp_millis() + (s as i64) * 1000);
        self.entries
            .insert(key.to_string(), LocalEntry { value, expires_at_ms });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        // Only the trailing-`*` glob used by cache key prefixes is supported,
        // matching the subset of `keys()` the Cache Manager actually needs.
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .entries
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let backend = InMemoryCacheBackend::new();
        backend.set("k", b"v".to_vec(), None).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let backend = InMemoryCacheBackend::new();
        backend.set("k", b"v".to_vec(), Some(0)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let backend = InMemoryCacheBackend::new();
        backend.set("k", b"v".to_vec(), None).await.unwrap();
        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_filters_by_prefix() {
        let backend = InMemoryCacheBackend::new();
        backend.set("scrape:a", b"1".to_vec(), None).await.unwrap();
        backend.set("other:b", b"2".to_vec(), None).await.unwrap();
        let keys = backend.keys("scrape:*").await.unwrap();
        assert_eq!(keys, vec!["scrape:a".to_string()]);
    }
}
