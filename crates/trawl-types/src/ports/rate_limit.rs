//! Rate-limit backend contract (spec §6): ordered-set primitives for the
//! sliding-window algorithm in spec §4.10.

use crate::error::Result;
use async_trait::async_trait;

/// Backend supporting the Redis-style sorted-set operations the sliding
/// window needs: add a timestamped member, count members in a score range,
/// remove members at or below a cutoff score, and refresh the key's TTL.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Remove members with score ≤ `cutoff_ms`.
    async fn remove_expired(&self, key: &str, cutoff_ms: i64) -> Result<()>;

    /// Count members currently stored under `key`.
    async fn count(&self, key: &str) -> Result<usize>;

    /// Add a new member with score `timestamp_ms`.
    async fn add_member(&self, key: &str, member: &str, timestamp_ms: i64) -> Result<()>;

    /// Remove a single member (used to undo a just-added member when the
    /// window turned out to be full — spec §4.10 local-path honesty rule).
    async fn remove_member(&self, key: &str, member: &str) -> Result<()>;

    /// Set/refresh the key's expiry.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;
}
