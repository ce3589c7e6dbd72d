//! Circuit breaker port (spec §4.11), modeled on the teacher's
//! `riptide_types::ports::circuit_breaker::CircuitBreaker` trait.

use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Backend-agnostic circuit breaker interface. Concrete state machine lives
/// in `trawl-reliability`; this trait lets `trawl-orchestrator` and
/// `trawl-extraction` depend on "a circuit breaker" without depending on the
/// concrete crate, and lets tests substitute a mock.
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    async fn state(&self) -> CircuitState;

    /// Acquire permission to execute a call. `Err` means fail fast: the
    /// dependency must not be invoked (spec §4.11, §7: a distinct
    /// non-retryable signal).
    async fn try_call(&self) -> Result<()>;

    async fn on_success(&self);
    async fn on_failure(&self);
}

/// Run `operation` behind `circuit`, recording success/failure automatically.
pub async fn with_circuit_breaker<F, Fut, T>(circuit: &dyn CircuitBreaker, operation: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    circuit.try_call().await?;
    match operation().await {
        Ok(value) => {
            circuit.on_success().await;
            Ok(value)
        }
        Err(e) => {
            circuit.on_failure().await;
            Err(e)
        }
    }
}
