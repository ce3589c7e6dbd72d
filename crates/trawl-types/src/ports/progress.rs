//! Progress-event sink contract (spec §6). The realtime event bus itself is
//! a Non-goal/external collaborator; this is the seam the Scrape Service
//! emits through.

use crate::scrape::ProgressEvent;
use async_trait::async_trait;

#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Delivery is at-least-once on the bus; emission order from a single
    /// job is totally ordered (spec §5), so implementations must not reorder
    /// events for the same `job_id`.
    async fn emit(&self, event: ProgressEvent);
}

/// A sink that drops every event. Useful as a default when the caller has no
/// event bus wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn emit(&self, _event: ProgressEvent) {}
}
