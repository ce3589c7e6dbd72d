//! Cache Manager (spec §4.9): tries the remote backend first, transparently
//! falling back to the in-process map on any remote error. Values are
//! JSON-encoded so a single manager instance can serve any `T`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use trawl_types::error::TrawlError;
use trawl_types::ports::CacheBackend;
use trawl_types::scrape::CacheLookup;
use trawl_types::Result;

use crate::local::InMemoryCacheBackend;

pub struct CacheManager {
    remote: Option<Arc<dyn CacheBackend>>,
    local: Arc<InMemoryCacheBackend>,
}

impl CacheManager {
    /// A manager with only the local fallback — used when no remote backend
    /// is configured (or in tests).
    pub fn local_only() -> Self {
        Self {
            remote: None,
            local: Arc::new(InMemoryCacheBackend::new()),
        }
    }

    pub fn with_remote(remote: Arc<dyn CacheBackend>) -> Self {
        Self {
            remote: Some(remote),
            local: Arc::new(InMemoryCacheBackend::new()),
        }
    }

    async fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(value) => return value,
                Err(err) => {
                    tracing::warn!(error = %err, key, "remote cache get failed, falling back to local");
                }
            }
        }
        self.local.get(key).await.unwrap_or(None)
    }

    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) {
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.set(key, value.clone(), ttl_secs).await {
                tracing::warn!(error = %err, key, "remote cache set failed, writing to local only");
            }
        }
        // Local fallback always receives the write too, so a subsequent
        // remote outage doesn't produce a spurious miss for data we already
        // had (spec §5: remote-backed components tolerate failure without
        // losing in-flight data).
        let _ = self.local.set(key, value, ttl_secs).await;
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<CacheLookup<T>> {
        match self.get_raw(key).await {
            Some(bytes) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => Ok(CacheLookup {
                    data: Some(value),
                    from_cache: true,
                    remaining_ttl: None,
                }),
                Err(err) => Err(TrawlError::Cache(format!("corrupt cache entry: {err}"))),
            },
            None => Ok(CacheLookup {
                data: None,
                from_cache: false,
                remaining_ttl: None,
            }),
        }
    }

    pub async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| TrawlError::Cache(e.to_string()))?;
        self.set_raw(key, bytes, ttl_secs).await;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.delete(key).await {
                tracing::warn!(error = %err, key, "remote cache delete failed");
            }
        }
        self.local.delete(key).await
    }

    pub async fn clear(&self) -> Result<()> {
        let keys = if let Some(remote) = &self.remote {
            remote.keys("*").await.unwrap_or_default()
        } else {
            Vec::new()
        };
        for key in keys {
            let _ = self.delete(&key).await;
        }
        let local_keys = self.local.keys("*").await.unwrap_or_default();
        for key in local_keys {
            let _ = self.local.delete(&key).await;
        }
        Ok(())
    }
}
