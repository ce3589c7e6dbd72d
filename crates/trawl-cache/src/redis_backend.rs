//! Redis-backed implementation of [`CacheBackend`], grounded on the
//! teacher's `riptide-cache` Redis adapters: a thin wrapper around
//! `redis::aio::MultiplexedConnection` with no retry logic of its own — any
//! failure propagates so the [`crate::manager::CacheManager`] can fall back
//! to the local backend.

use async_trait::async_trait;
use redis::AsyncCommands;
use trawl_types::error::TrawlError;
use trawl_types::ports::CacheBackend;
use trawl_types::Result;

pub struct RedisCacheBackend {
    client: redis::Client,
}

impl RedisCacheBackend {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client =
            redis::Client::open(redis_url).map_err(|e| TrawlError::Cache(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TrawlError::Cache(e.to_string()))
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|e| TrawlError::Cache(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.connection().await?;
        match ttl_secs {
            Some(ttl) if ttl > 0 => conn
                .set_ex::<_, _, ()>(key, value, ttl)
                .await
                .map_err(|e| TrawlError::Cache(e.to_string())),
            _ => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| TrawlError::Cache(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| TrawlError::Cache(e.to_string()))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        conn.keys(pattern)
            .await
            .map_err(|e| TrawlError::Cache(e.to_string()))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| TrawlError::Cache(e.to_string()))
    }
}
