//! Sliding-window Rate Limiter (spec §4.10): tries the remote backend
//! first, falling back transparently to the local in-process backend.

use std::sync::Arc;

use chrono::Utc;
use trawl_types::ports::RateLimitBackend;

use crate::local_rate_limit::LocalRateLimitBackend;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Number of requests counted in the window after this decision.
    pub current_count: usize,
}

pub struct RateLimiter {
    remote: Option<Arc<dyn RateLimitBackend>>,
    local: Arc<LocalRateLimitBackend>,
    window_ms: i64,
    max_requests: usize,
}

impl RateLimiter {
    pub fn new(window_ms: u64, max_requests: usize) -> Self {
        Self {
            remote: None,
            local: Arc::new(LocalRateLimitBackend::new()),
            window_ms: window_ms as i64,
            max_requests,
        }
    }

    pub fn with_remote(window_ms: u64, max_requests: usize, remote: Arc<dyn RateLimitBackend>) -> Self {
        Self {
            remote: Some(remote),
            local: Arc::new(LocalRateLimitBackend::new()),
            window_ms: window_ms as i64,
            max_requests,
        }
    }

    /// Run the sliding-window check for `key`: remove expired members, count
    /// current members, add the new member, set the key TTL. Allowed iff
    /// `new_count <= max_requests`. When not allowed, the just-added member
    /// is popped so the backend's view stays honest (spec §4.10).
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let rate_limit_key = format!("rate_limit:{key}");
        let now_ms = Utc::now().timestamp_millis();
        let cutoff = now_ms - self.window_ms;

        if let Some(remote) = &self.remote {
            match self.check_with_backend(remote.as_ref(), &rate_limit_key, now_ms, cutoff).await {
                Ok(decision) => return decision,
                Err(err) => {
                    tracing::warn!(error = %err, key, "remote rate limiter failed, falling back to local");
                }
            }
        }

        self.check_with_backend(self.local.as_ref(), &rate_limit_key, now_ms, cutoff)
            .await
            .unwrap_or(RateLimitDecision {
                allowed: true,
                current_count: 0,
            })
    }

    async fn check_with_backend(
        &self,
        backend: &dyn RateLimitBackend,
        key: &str,
        now_ms: i64,
        cutoff_ms: i64,
    ) -> trawl_types::Result<RateLimitDecision> {
        backend.remove_expired(key, cutoff_ms).await?;
        let member = format!("{now_ms}-{}", fastrand::u64(..));
        backend.add_member(key, &member, now_ms).await?;
        let count = backend.count(key).await?;
        let ttl_secs = ((self.window_ms as u64) + 999) / 1000;
        backend.expire(key, ttl_secs.max(1)).await?;

        let allowed = count <= self.max_requests;
        if !allowed {
            backend.remove_member(key, &member).await?;
        }
        Ok(RateLimitDecision {
            allowed,
            current_count: count.min(self.max_requests),
        })
    }

    /// Periodic sweep: remove local keys whose window has fully passed.
    pub fn sweep_local(&self) {
        self.local.sweep(Utc::now().timestamp_millis(), self.window_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_max_requests_in_window() {
        let limiter = RateLimiter::new(1000, 3);
        assert!(limiter.check("k").await.allowed);
        assert!(limiter.check("k").await.allowed);
        assert!(limiter.check("k").await.allowed);
        assert!(!limiter.check("k").await.allowed);
    }

    #[tokio::test]
    async fn denied_decision_does_not_consume_a_slot() {
        let limiter = RateLimiter::new(1000, 1);
        assert!(limiter.check("k").await.allowed);
        assert!(!limiter.check("k").await.allowed);
        assert!(!limiter.check("k").await.allowed);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_windows() {
        let limiter = RateLimiter::new(1000, 1);
        assert!(limiter.check("a").await.allowed);
        assert!(limiter.check("b").await.allowed);
    }
}
