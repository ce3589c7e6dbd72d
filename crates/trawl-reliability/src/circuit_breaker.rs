//! Per-dependency Circuit Breaker (spec §4.11): closed → open on rolling
//! error rate, open → half-open after a timeout, and a single half-open
//! probe decides the next transition.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use trawl_types::error::TrawlError;
use trawl_types::ports::circuit_breaker::{CircuitBreaker as CircuitBreakerPort, CircuitState};
use trawl_types::Result;

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub error_threshold_pct: f64,
    pub minimum_requests: u64,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            error_threshold_pct: 50.0,
            minimum_requests: 4,
            reset_timeout_ms: 30_000,
        }
    }
}

/// Transition notification emitted by a breaker (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    HalfOpened,
    Closed,
}

#[async_trait]
pub trait CircuitTransitionListener: Send + Sync {
    async fn on_transition(&self, dependency: &str, transition: Transition);
}

struct Inner {
    state: CircuitState,
    requests: u64,
    failures: u64,
    last_open_at: Option<DateTime<Utc>>,
    half_open_probe_in_flight: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            requests: 0,
            failures: 0,
            last_open_at: None,
            half_open_probe_in_flight: false,
        }
    }
}

pub struct DependencyCircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    listener: Option<Arc<dyn CircuitTransitionListener>>,
}

impl DependencyCircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner::default()),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn CircuitTransitionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    async fn notify(&self, transition: Transition) {
        if let Some(listener) = &self.listener {
            listener.on_transition(&self.name, transition).await;
        }
    }
}

#[async_trait]
impl CircuitBreakerPort for DependencyCircuitBreaker {
    async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    async fn try_call(&self) -> Result<()> {
        let mut transition = None;
        let result = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                CircuitState::Closed => Ok(()),
                CircuitState::Open => {
                    let elapsed = inner
                        .last_open_at
                        .map(|opened| Utc::now() - opened)
                        .unwrap_or_default();
                    if elapsed.num_milliseconds() >= self.config.reset_timeout_ms as i64 {
                        inner.state = CircuitState::HalfOpen;
                        inner.half_open_probe_in_flight = true;
                        transition = Some(Transition::HalfOpened);
                        Ok(())
                    } else {
                        Err(TrawlError::CircuitOpen {
                            dependency: self.name.clone(),
                        })
                    }
                }
                CircuitState::HalfOpen => {
                    if inner.half_open_probe_in_flight {
                        Err(TrawlError::CircuitOpen {
                            dependency: self.name.clone(),
                        })
                    } else {
                        inner.half_open_probe_in_flight = true;
                        Ok(())
                    }
                }
            }
        };
        if let Some(t) = transition {
            self.notify(t).await;
        }
        result
    }

    async fn on_success(&self) {
        let mut transition = None;
        {
            let mut inner = self.inner.lock().await;
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.state = CircuitState::Closed;
                    inner.requests = 0;
                    inner.failures = 0;
                    inner.half_open_probe_in_flight = false;
                    transition = Some(Transition::Closed);
                }
                CircuitState::Closed => {
                    inner.requests += 1;
                    // A rolling window of the most recent min_requests decisions:
                    // once we have enough history, let old successes age out so
                    // a long healthy run doesn't dilute a fresh failure streak.
                    if inner.requests > self.config.minimum_requests * 4 {
                        inner.requests = self.config.minimum_requests;
                        inner.failures = 0;
                    }
                }
                CircuitState::Open => {}
            }
        }
        if let Some(t) = transition {
            self.notify(t).await;
        }
    }

    async fn on_failure(&self) {
        let mut transition = None;
        {
            let mut inner = self.inner.lock().await;
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.state = CircuitState::Open;
                    inner.last_open_at = Some(Utc::now());
                    inner.half_open_probe_in_flight = false;
                    transition = Some(Transition::Opened);
                }
                CircuitState::Closed => {
                    inner.requests += 1;
                    inner.failures += 1;
                    if inner.requests >= self.config.minimum_requests {
                        let error_rate = (inner.failures as f64 / inner.requests as f64) * 100.0;
                        if error_rate >= self.config.error_threshold_pct {
                            inner.state = CircuitState::Open;
                            inner.last_open_at = Some(Utc::now());
                            transition = Some(Transition::Opened);
                        }
                    }
                }
                CircuitState::Open => {}
            }
        }
        if let Some(t) = transition {
            self.notify(t).await;
        }
    }
}

/// Keyed collection of breakers, one per external dependency (spec §4.11).
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<DependencyCircuitBreaker>>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            default_config,
        }
    }

    pub async fn get_or_create(&self, dependency: &str) -> Arc<DependencyCircuitBreaker> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(dependency.to_string())
            .or_insert_with(|| {
                Arc::new(DependencyCircuitBreaker::new(
                    dependency,
                    self.default_config.clone(),
                ))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_breached_with_min_requests() {
        let cb = DependencyCircuitBreaker::new(
            "dep",
            CircuitBreakerConfig {
                error_threshold_pct: 50.0,
                minimum_requests: 4,
                reset_timeout_ms: 30_000,
            },
        );
        for _ in 0..4 {
            cb.try_call().await.unwrap();
            cb.on_failure().await;
        }
        assert_eq!(cb.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn open_circuit_fails_fast_without_invoking_dependency() {
        let cb = DependencyCircuitBreaker::new("dep", CircuitBreakerConfig::default());
        for _ in 0..4 {
            cb.try_call().await.unwrap();
            cb.on_failure().await;
        }
        assert!(cb.try_call().await.is_err());
    }

    #[tokio::test]
    async fn half_open_probe_succeeds_closes_circuit() {
        let cb = DependencyCircuitBreaker::new(
            "dep",
            CircuitBreakerConfig {
                error_threshold_pct: 50.0,
                minimum_requests: 2,
                reset_timeout_ms: 0,
            },
        );
        cb.try_call().await.unwrap();
        cb.on_failure().await;
        cb.try_call().await.unwrap();
        cb.on_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);

        // reset_timeout_ms = 0, so the next try_call immediately probes.
        cb.try_call().await.unwrap();
        assert_eq!(cb.state().await, CircuitState::HalfOpen);
        cb.on_success().await;
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_probe_failure_reopens() {
        let cb = DependencyCircuitBreaker::new(
            "dep",
            CircuitBreakerConfig {
                error_threshold_pct: 50.0,
                minimum_requests: 2,
                reset_timeout_ms: 0,
            },
        );
        cb.try_call().await.unwrap();
        cb.on_failure().await;
        cb.try_call().await.unwrap();
        cb.on_failure().await;
        cb.try_call().await.unwrap();
        cb.on_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn registry_reuses_breaker_per_dependency() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
        let a = registry.get_or_create("llm").await;
        let b = registry.get_or_create("llm").await;
        assert!(Arc::ptr_eq(&a, &b));
    }
}
