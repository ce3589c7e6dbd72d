//! In-process sliding-window rate-limit backend (spec §4.10 local path):
//! a timestamp list per key, mirroring the remote sorted-set semantics.

use async_trait::async_trait;
use dashmap::DashMap;
use trawl_types::Result;

#[derive(Default)]
pub struct LocalRateLimitBackend {
    windows: DashMap<String, Vec<i64>>,
}

impl LocalRateLimitBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove keys whose entire window has fully passed (spec §4.10:
    /// periodic sweep). A key survives if it has any timestamp newer than
    /// `now_ms - window_ms`.
    pub fn sweep(&self, now_ms: i64, window_ms: i64) {
        let cutoff = now_ms - window_ms;
        self.windows
            .retain(|_, timestamps| timestamps.iter().any(|ts| *ts > cutoff));
    }
}

#[async_trait]
impl trawl_types::ports::RateLimitBackend for LocalRateLimitBackend {
    async fn remove_expired(&self, key: &str, cutoff_ms: i64) -> Result<()> {
        if let Some(mut entry) = self.windows.get_mut(key) {
            entry.retain(|ts| *ts > cutoff_ms);
        }
        Ok(())
    }

    async fn count(&self, key: &str) -> Result<usize> {
        Ok(self.windows.get(key).map(|e| e.len()).unwrap_or(0))
    }

    async fn add_member(&self, key: &str, _member: &str, timestamp_ms: i64) -> Result<()> {
        self.windows.entry(key.to_string()).or_default().push(timestamp_ms);
        Ok(())
    }

    async fn remove_member(&self, key: &str, _member: &str) -> Result<()> {
        // Local path's member identity is just the timestamp most recently
        // appended; popping the tail keeps the list honest per spec §4.10.
        if let Some(mut entry) = self.windows.get_mut(key) {
            entry.pop();
        }
        Ok(())
    }

    async fn expire(&self, _key: &str, _ttl_secs: u64) -> Result<()> {
        // The local backend has no separate TTL mechanism; expiry is
        // enforced by `remove_expired` on every call plus the periodic sweep.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trawl_types::ports::RateLimitBackend;

    #[tokio::test]
    async fn add_then_count_reflects_members() {
        let backend = LocalRateLimitBackend::new();
        backend.add_member("k", "1-a", 100).await.unwrap();
        backend.add_member("k", "2-b", 200).await.unwrap();
        assert_eq!(backend.count("k").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn remove_expired_drops_old_entries() {
        let backend = LocalRateLimitBackend::new();
        backend.add_member("k", "1", 100).await.unwrap();
        backend.add_member("k", "2", 900).await.unwrap();
        backend.remove_expired("k", 500).await.unwrap();
        assert_eq!(backend.count("k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_member_pops_most_recent() {
        let backend = LocalRateLimitBackend::new();
        backend.add_member("k", "1", 100).await.unwrap();
        backend.remove_member("k", "1").await.unwrap();
        assert_eq!(backend.count("k").await.unwrap(), 0);
    }
}
