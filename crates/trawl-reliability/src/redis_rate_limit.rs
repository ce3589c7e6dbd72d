//! Redis-backed sliding-window rate-limit backend (spec §4.10 remote path):
//! a sorted set keyed `rate_limit:<key>`, score = timestamp, member =
//! `<ts>-<random>`, grounded on the teacher's `riptide-cache` Redis adapters.

use async_trait::async_trait;
use redis::AsyncCommands;
use trawl_types::error::TrawlError;
use trawl_types::ports::RateLimitBackend;
use trawl_types::Result;

pub struct RedisRateLimitBackend {
    client: redis::Client,
}

impl RedisRateLimitBackend {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client =
            redis::Client::open(redis_url).map_err(|e| TrawlError::RateLimited(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }
}

#[async_trait]
impl RateLimitBackend for RedisRateLimitBackend {
    async fn remove_expired(&self, key: &str, cutoff_ms: i64) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.zrembyscore::<_, _, _, ()>(key, "-inf", cutoff_ms)
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }

    async fn count(&self, key: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        conn.zcard(key)
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }

    async fn add_member(&self, key: &str, member: &str, timestamp_ms: i64) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.zadd::<_, _, _, ()>(key, member, timestamp_ms)
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }

    async fn remove_member(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.zrem::<_, _, ()>(key, member)
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.expire::<_, ()>(key, ttl_secs as i64)
            .await
            .map_err(|e| TrawlError::RateLimited(e.to_string()))
    }
}
