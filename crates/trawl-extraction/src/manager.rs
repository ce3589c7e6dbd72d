//! Extraction Manager (spec §4.15): a registry of extraction strategies
//! keyed by a strategy tag, with preferred-then-fallback execution.

use std::sync::Arc;

use tokio::sync::RwLock;
use trawl_types::extraction::{ExtractionContext, ExtractionResult};

use crate::strategy::ExtractionStrategy;

struct Registry {
    order: Vec<String>,
    strategies: std::collections::HashMap<String, Arc<dyn ExtractionStrategy>>,
    default_tag: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            strategies: std::collections::HashMap::new(),
            default_tag: None,
        }
    }
}

/// Registry + dispatcher for entity-extraction strategies (spec §4.15).
pub struct ExtractionManager {
    registry: RwLock<Registry>,
}

impl Default for ExtractionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionManager {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Register a strategy. The first strategy registered becomes the
    /// default (spec §4.15 registry state machine).
    pub async fn register(&self, strategy: Arc<dyn ExtractionStrategy>) {
        let tag = strategy.tag().to_string();
        let mut registry = self.registry.write().await;
        if !registry.strategies.contains_key(&tag) {
            registry.order.push(tag.clone());
        }
        let is_first = registry.default_tag.is_none();
        registry.strategies.insert(tag.clone(), strategy);
        if is_first {
            registry.default_tag = Some(tag);
        }
    }

    /// Remove a strategy. If it was the default, the next registered
    /// strategy (in registration order) is promoted; removing the last
    /// strategy clears the default (spec §4.15).
    pub async fn unregister(&self, tag: &str) {
        let mut registry = self.registry.write().await;
        registry.strategies.remove(tag);
        registry.order.retain(|t| t != tag);

        if registry.default_tag.as_deref() == Some(tag) {
            registry.default_tag = registry.order.first().cloned();
        }
    }

    pub async fn default_tag(&self) -> Option<String> {
        self.registry.read().await.default_tag.clone()
    }

    /// Extract using `tag`, or the registered default when `tag` is `None`.
    pub async fn extract(&self, ctx: &ExtractionContext, tag: Option<&str>) -> ExtractionResult {
        let strategy = {
            let registry = self.registry.read().await;
            let resolved_tag = tag
                .map(str::to_string)
                .or_else(|| registry.default_tag.clone());
            match resolved_tag.and_then(|t| registry.strategies.get(&t).cloned()) {
                Some(s) => s,
                None => {
                    return ExtractionResult::failure(
                        tag.unwrap_or("none"),
                        "no extraction strategy registered for the requested tag",
                    )
                }
            }
        };
        strategy.extract(ctx).await
    }

    /// Try `preferred` tags in order, then every remaining registered
    /// strategy in registration order. Strategies that are unavailable are
    /// skipped. Returns the first `success=true` result, or a synthetic
    /// failure when every strategy has been exhausted (spec §4.15).
    pub async fn extract_with_fallback(
        &self,
        ctx: &ExtractionContext,
        preferred: &[&str],
    ) -> ExtractionResult {
        let candidates = {
            let registry = self.registry.read().await;
            let mut seen = std::collections::HashSet::new();
            let mut ordered = Vec::new();
            for tag in preferred {
                if seen.insert(tag.to_string()) {
                    if let Some(s) = registry.strategies.get(*tag) {
                        ordered.push(s.clone());
                    }
                }
            }
            for tag in &registry.order {
                if seen.insert(tag.clone()) {
                    if let Some(s) = registry.strategies.get(tag) {
                        ordered.push(s.clone());
                    }
                }
            }
            ordered
        };

        for strategy in candidates {
            if !strategy.is_available().await {
                continue;
            }
            let result = strategy.extract(ctx).await;
            if result.success {
                return result;
            }
        }
        ExtractionResult::all_strategies_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedStrategy {
        tag: &'static str,
        available: AtomicBool,
        succeeds: bool,
    }

    #[async_trait]
    impl ExtractionStrategy for FixedStrategy {
        fn tag(&self) -> &str {
            self.tag
        }

        async fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        async fn extract(&self, _ctx: &ExtractionContext) -> ExtractionResult {
            if self.succeeds {
                ExtractionResult {
                    entities: Vec::new(),
                    success: true,
                    confidence: Some(0.9),
                    strategy_tag: self.tag.to_string(),
                    execution_time_ms: 1,
                    error: None,
                    metadata: None,
                }
            } else {
                ExtractionResult::failure(self.tag, "nope")
            }
        }
    }

    fn ctx() -> ExtractionContext {
        ExtractionContext {
            html: String::new(),
            markdown: String::new(),
            text: String::new(),
            url: "https://example.com".to_string(),
            task_description: None,
            entity_types: None,
        }
    }

    #[tokio::test]
    async fn first_registered_strategy_becomes_default() {
        let manager = ExtractionManager::new();
        manager
            .register(Arc::new(FixedStrategy {
                tag: "llm",
                available: AtomicBool::new(true),
                succeeds: true,
            }))
            .await;
        assert_eq!(manager.default_tag().await.as_deref(), Some("llm"));
    }

    #[tokio::test]
    async fn removing_default_promotes_next_registered() {
        let manager = ExtractionManager::new();
        manager
            .register(Arc::new(FixedStrategy {
                tag: "llm",
                available: AtomicBool::new(true),
                succeeds: true,
            }))
            .await;
        manager
            .register(Arc::new(FixedStrategy {
                tag: "rule_based",
                available: AtomicBool::new(true),
                succeeds: true,
            }))
            .await;
        manager.unregister("llm").await;
        assert_eq!(manager.default_tag().await.as_deref(), Some("rule_based"));
    }

    #[tokio::test]
    async fn removing_last_strategy_clears_default() {
        let manager = ExtractionManager::new();
        manager
            .register(Arc::new(FixedStrategy {
                tag: "llm",
                available: AtomicBool::new(true),
                succeeds: true,
            }))
            .await;
        manager.unregister("llm").await;
        assert_eq!(manager.default_tag().await, None);
    }

    #[tokio::test]
    async fn fallback_skips_unavailable_and_failed_strategies() {
        let manager = ExtractionManager::new();
        manager
            .register(Arc::new(FixedStrategy {
                tag: "llm",
                available: AtomicBool::new(false),
                succeeds: true,
            }))
            .await;
        manager
            .register(Arc::new(FixedStrategy {
                tag: "cosine",
                available: AtomicBool::new(true),
                succeeds: false,
            }))
            .await;
        manager
            .register(Arc::new(FixedStrategy {
                tag: "rule_based",
                available: AtomicBool::new(true),
                succeeds: true,
            }))
            .await;

        let result = manager.extract_with_fallback(&ctx(), &["llm", "cosine"]).await;
        assert!(result.success);
        assert_eq!(result.strategy_tag, "rule_based");
    }

    #[tokio::test]
    async fn fallback_returns_synthetic_failure_when_all_fail() {
        let manager = ExtractionManager::new();
        manager
            .register(Arc::new(FixedStrategy {
                tag: "llm",
                available: AtomicBool::new(true),
                succeeds: false,
            }))
            .await;
        let result = manager.extract_with_fallback(&ctx(), &[]).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("All extraction strategies failed"));
    }
}
