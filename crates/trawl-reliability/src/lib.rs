//! Sliding-window Rate Limiter and per-dependency Circuit Breakers
//! (spec §4.10, §4.11).

pub mod circuit_breaker;
pub mod local_rate_limit;
pub mod rate_limiter;
pub mod redis_rate_limit;

pub use circuit_breaker::{
    CircuitBreakerConfig, CircuitBreakerRegistry, CircuitTransitionListener,
    DependencyCircuitBreaker, Transition,
};
pub use local_rate_limit::LocalRateLimitBackend;
pub use rate_limiter::{RateLimitDecision, RateLimiter};
pub use redis_rate_limit::RedisRateLimitBackend;
