//! Cache backend contract (spec §6): `get/set/del/keys/ping`, any call may fail.

use crate::error::Result;
use async_trait::async_trait;

/// A key/value backend with TTL, used by the Cache Manager (spec §4.9). Any
/// call may fail — failures trigger a transparent fallback to the local
/// in-process backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn ping(&self) -> Result<()>;
}
