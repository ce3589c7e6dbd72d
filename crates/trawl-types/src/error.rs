//! Error taxonomy for the Trawl engine.
//!
//! Mirrors the retryability table in spec §7: `Network`, `Timeout`,
//! `RateLimited`, `ServerError`, `Unknown` are retryable; `Blocked`,
//! `AuthRequired`, `NotFound`, `ParseError` are fatal.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`TrawlError`].
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Unified error type for Trawl operations.
#[derive(Error, Debug)]
pub enum TrawlError {
    /// Transport-level failure talking to an external dependency.
    #[error("network error: {0}")]
    Network(String),

    /// An outbound call exceeded its deadline.
    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    /// Target actively refused the request (captcha, bot-wall, Cloudflare
    /// challenge, explicit access-denied).
    #[error("blocked: {0}")]
    Blocked(String),

    /// The sliding-window limiter or the dependency itself rejected the call.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The target host requires authenticated session state we don't have.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// 404-equivalent: resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// 5xx-equivalent: the dependency itself failed.
    #[error("server error: {0}")]
    ServerError(String),

    /// Response payload could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Anything that doesn't fit the above, but isn't a bug in this crate.
    #[error("unknown error: {0}")]
    Unknown(String),

    /// Cache backend (remote or local) failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// Circuit breaker is open; the call was never attempted.
    #[error("circuit breaker open for {dependency}")]
    CircuitOpen { dependency: String },

    /// Session store failure (load/save/cleanup).
    #[error("session store error: {0}")]
    Session(String),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every scraper tier in a strategy failed.
    #[error("all scrapers failed: {0}")]
    AllScrapersFailed(String),

    /// Every registered extraction strategy failed.
    #[error("all extraction strategies failed")]
    AllExtractionFailed,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl TrawlError {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        TrawlError::Custom(msg.into())
    }

    /// Retryability table from spec §7.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrawlError::Network(_)
                | TrawlError::Timeout(_)
                | TrawlError::RateLimited(_)
                | TrawlError::ServerError(_)
                | TrawlError::Unknown(_)
        )
    }

    /// Fatal errors that must never be retried, per spec §7.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrawlError::Blocked(_)
                | TrawlError::AuthRequired(_)
                | TrawlError::NotFound(_)
                | TrawlError::ParseError(_)
        )
    }

    /// Suggested retry-after delay per spec §7, or `None` when the caller
    /// should fall back to exponential backoff with jitter.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TrawlError::RateLimited(_) => Some(Duration::from_secs(60)),
            TrawlError::ServerError(_) => Some(Duration::from_secs(10)),
            TrawlError::Network(_) => Some(Duration::from_secs(3)),
            TrawlError::Timeout(_) => Some(Duration::from_secs(5)),
            _ => None,
        }
    }
}

/// Exponential backoff with jitter: `base * 2^attempt + U(0, 1s)`, capped at 60s.
pub fn backoff_delay(base_ms: u64, attempt: u32, jitter: impl FnOnce() -> Duration) -> Duration {
    let exp = base_ms.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX).max(1));
    let capped = exp.min(60_000);
    Duration::from_millis(capped) + jitter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors_match_spec_table() {
        assert!(TrawlError::Network("x".into()).is_retryable());
        assert!(TrawlError::Timeout(100).is_retryable());
        assert!(TrawlError::RateLimited("x".into()).is_retryable());
        assert!(TrawlError::ServerError("x".into()).is_retryable());
        assert!(TrawlError::Unknown("x".into()).is_retryable());
        assert!(!TrawlError::Blocked("x".into()).is_retryable());
    }

    #[test]
    fn fatal_errors_match_spec_table() {
        assert!(TrawlError::Blocked("x".into()).is_fatal());
        assert!(TrawlError::AuthRequired("x".into()).is_fatal());
        assert!(TrawlError::NotFound("x".into()).is_fatal());
        assert!(TrawlError::ParseError("x".into()).is_fatal());
        assert!(!TrawlError::Network("x".into()).is_fatal());
    }

    #[test]
    fn retry_after_hints() {
        assert_eq!(
            TrawlError::RateLimited("x".into()).retry_after(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            TrawlError::ServerError("x".into()).retry_after(),
            Some(Duration::from_secs(10))
        );
        assert!(TrawlError::Blocked("x".into()).retry_after().is_none());
    }

    #[test]
    fn backoff_caps_at_60s() {
        let d = backoff_delay(1000, 20, || Duration::ZERO);
        assert_eq!(d, Duration::from_secs(60));
    }
}
