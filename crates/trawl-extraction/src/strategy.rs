//! The pluggable entity-extraction strategy interface (spec §4.15).

use async_trait::async_trait;
use trawl_types::extraction::{ExtractionContext, ExtractionResult};

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Stable identifier used to look the strategy up in the registry
    /// (spec §3: `ExtractionResult.strategy_tag`).
    fn tag(&self) -> &str;

    /// Whether this strategy can run right now (e.g. an LLM-backed strategy
    /// with no configured API key is unavailable). Unavailable strategies
    /// are skipped by [`crate::manager::ExtractionManager::extract_with_fallback`].
    async fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult;
}
