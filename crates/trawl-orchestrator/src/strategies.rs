//! The four named escalation policies (spec §4.14), composed over the
//! shared [`crate::harness::run_tier`] harness. Dynamic dispatch via a small
//! `execute/name/description` interface, matching the teacher's
//! `StrategyRegistry`/`ExtractionStrategy` pattern — no inheritance, the
//! harness is composed into each strategy rather than extended.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use trawl_types::error::{Result, TrawlError};
use trawl_types::orchestration::{OrchestrationAttempt, OrchestrationResult, StrategyTag};
use trawl_types::ports::ScraperPort;
use trawl_types::scrape::ScraperTier;

use crate::harness::{run_tier, AttemptContext};
use crate::validator::ContentValidator;

/// Maps each named tier to the concrete scraper adapter that serves it.
/// Concrete adapters are the caller's collaborators; this registry only
/// holds what's wired in for the current deployment.
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: HashMap<ScraperTier, Arc<dyn ScraperPort>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tier: ScraperTier, scraper: Arc<dyn ScraperPort>) {
        self.scrapers.insert(tier, scraper);
    }

    pub fn get(&self, tier: ScraperTier) -> Option<&Arc<dyn ScraperPort>> {
        self.scrapers.get(&tier)
    }
}

#[async_trait]
pub trait Strategy: Send + Sync {
    fn tag(&self) -> StrategyTag;
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    async fn execute(
        &self,
        scrapers: &ScraperRegistry,
        ctx: &AttemptContext<'_>,
        validator: &ContentValidator,
    ) -> Result<OrchestrationResult>;
}

/// Looks up `tier` in the registry and runs it; `Err` means the tier isn't
/// wired in for this deployment, which is recorded as a failed attempt so
/// the caller's escalation logic treats it the same as a scraper failure.
async fn run_registered_tier(
    scrapers: &ScraperRegistry,
    tier: ScraperTier,
    ctx: &AttemptContext<'_>,
    validator: &ContentValidator,
) -> (OrchestrationAttempt, Option<trawl_types::extraction::ValidationOutcome>) {
    match scrapers.get(tier) {
        Some(scraper) => run_tier(tier, scraper.as_ref(), ctx, validator).await,
        None => (
            OrchestrationAttempt {
                scraper_tag: tier,
                success: false,
                result: None,
                execution_time_ms: 0,
                error: Some(format!("no scraper registered for tier {tier}")),
                quality_score: None,
                validation_reason: None,
            },
            None,
        ),
    }
}

fn finish(
    strategy_tag: StrategyTag,
    attempts: Vec<OrchestrationAttempt>,
    started: Instant,
    metadata: Option<HashMap<String, String>>,
) -> Result<OrchestrationResult> {
    let total_time_ms = started.elapsed().as_millis() as u64;
    match attempts.iter().rev().find(|a| a.success) {
        Some(winner) => Ok(OrchestrationResult {
            final_result: winner.result.clone().expect("successful attempt carries a result"),
            scraper_that_won: winner.scraper_tag,
            attempts,
            total_time_ms,
            strategy_tag,
            metadata,
        }),
        None => {
            let last_error = attempts
                .last()
                .and_then(|a| a.error.clone())
                .unwrap_or_else(|| "no tiers attempted".to_string());
            Err(TrawlError::AllScrapersFailed(last_error))
        }
    }
}

/// [HTTP] → validate; if insufficient, [SmartHeadless]; on failure, [StandardHeadless].
pub struct SpeedFirst;

#[async_trait]
impl Strategy for SpeedFirst {
    fn tag(&self) -> StrategyTag {
        StrategyTag::SpeedFirst
    }
    fn name(&self) -> &str {
        "speed_first"
    }
    fn description(&self) -> &str {
        "HTTP first, escalating to headless tiers only when content is insufficient"
    }

    async fn execute(
        &self,
        scrapers: &ScraperRegistry,
        ctx: &AttemptContext<'_>,
        validator: &ContentValidator,
    ) -> Result<OrchestrationResult> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        for tier in [ScraperTier::Http, ScraperTier::SmartHeadless, ScraperTier::Headless] {
            let (attempt, outcome) = run_registered_tier(scrapers, tier, ctx, validator).await;
            let sufficient = attempt.success && outcome.as_ref().is_some_and(|o| o.sufficient);
            let is_last = tier == ScraperTier::Headless;
            let accept = sufficient || (attempt.success && is_last);
            attempts.push(attempt);
            if accept {
                break;
            }
        }

        finish(self.tag(), attempts, started, None)
    }
}

/// [SmartHeadless] accept iff quality≥0.7; else [Reader] accept iff
/// quality≥0.6; else [HTTP] accept unconditionally.
pub struct QualityFirst;

#[async_trait]
impl Strategy for QualityFirst {
    fn tag(&self) -> StrategyTag {
        StrategyTag::QualityFirst
    }
    fn name(&self) -> &str {
        "quality_first"
    }
    fn description(&self) -> &str {
        "Escalating thresholds favoring the highest-fidelity tier that clears its bar"
    }

    async fn execute(
        &self,
        scrapers: &ScraperRegistry,
        ctx: &AttemptContext<'_>,
        validator: &ContentValidator,
    ) -> Result<OrchestrationResult> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        let tiers: [(ScraperTier, Option<f64>); 3] = [
            (ScraperTier::SmartHeadless, Some(0.7)),
            (ScraperTier::Reader, Some(0.6)),
            (ScraperTier::Http, None),
        ];

        for (tier, threshold) in tiers {
            let (attempt, outcome) = run_registered_tier(scrapers, tier, ctx, validator).await;
            let accept = match threshold {
                Some(min_quality) => attempt.success && outcome.as_ref().is_some_and(|o| o.quality_score >= min_quality),
                None => attempt.success,
            };
            attempts.push(attempt);
            if accept {
                break;
            }
        }

        finish(self.tag(), attempts, started, None)
    }
}

/// [HTTP] → [Cheerio] → [Reader] → [Headless]; each tier runs the validator
/// and accepts on `sufficient`; the final tier accepts unconditionally.
pub struct CostFirst;

#[async_trait]
impl Strategy for CostFirst {
    fn tag(&self) -> StrategyTag {
        StrategyTag::CostFirst
    }
    fn name(&self) -> &str {
        "cost_first"
    }
    fn description(&self) -> &str {
        "Cheapest tiers first, escalating only as far as needed to reach sufficiency"
    }

    async fn execute(
        &self,
        scrapers: &ScraperRegistry,
        ctx: &AttemptContext<'_>,
        validator: &ContentValidator,
    ) -> Result<OrchestrationResult> {
        let started = Instant::now();
        let mut attempts = Vec::new();
        let tiers = [
            ScraperTier::Http,
            ScraperTier::Cheerio,
            ScraperTier::Reader,
            ScraperTier::Headless,
        ];

        for (i, tier) in tiers.iter().enumerate() {
            let (attempt, outcome) = run_registered_tier(scrapers, *tier, ctx, validator).await;
            let is_last = i == tiers.len() - 1;
            let accept = (attempt.success && outcome.as_ref().is_some_and(|o| o.sufficient)) || (attempt.success && is_last);
            attempts.push(attempt);
            if accept {
                break;
            }
        }

        finish(self.tag(), attempts, started, None)
    }
}

/// Picks an ordered tier list by URL heuristics; on total failure, falls
/// back to [`SpeedFirst`] and annotates `adaptive_selection_failed=true`.
pub struct Adaptive;

impl Adaptive {
    /// URL heuristics from spec §4.14. Tags are kept distinct per spec §9
    /// Open Question (c): "smart" and "standard" headless attempts never
    /// share a scraper tag.
    fn tier_order_for(url: &str) -> Vec<ScraperTier> {
        let lower = url.to_ascii_lowercase();
        let is_spa_like = ["spa", "react", "vue", "angular"].iter().any(|s| lower.contains(s))
            || ["/#/", "/#!/", "_escaped_fragment_"].iter().any(|s| lower.contains(s));
        let is_content_like = ["blog", "article", "news"].iter().any(|s| lower.contains(s));
        let is_commerce_like = ["shop", "store", "product"].iter().any(|s| lower.contains(s));

        if is_spa_like || is_commerce_like {
            vec![ScraperTier::SmartHeadless, ScraperTier::Headless, ScraperTier::Http]
        } else if is_content_like {
            vec![ScraperTier::Http, ScraperTier::Reader, ScraperTier::SmartHeadless]
        } else {
            vec![ScraperTier::Http, ScraperTier::SmartHeadless, ScraperTier::Headless]
        }
    }
}

#[async_trait]
impl Strategy for Adaptive {
    fn tag(&self) -> StrategyTag {
        StrategyTag::Adaptive
    }
    fn name(&self) -> &str {
        "adaptive"
    }
    fn description(&self) -> &str {
        "Picks a tier ordering from URL heuristics, falling back to speed_first on total failure"
    }

    async fn execute(
        &self,
        scrapers: &ScraperRegistry,
        ctx: &AttemptContext<'_>,
        validator: &ContentValidator,
    ) -> Result<OrchestrationResult> {
        let started = Instant::now();
        let tiers = Self::tier_order_for(ctx.url);
        let last_index = tiers.len() - 1;
        let mut attempts = Vec::new();

        for (i, tier) in tiers.into_iter().enumerate() {
            let (attempt, outcome) = run_registered_tier(scrapers, tier, ctx, validator).await;
            let is_last = i == last_index;
            let accept = (attempt.success && outcome.as_ref().is_some_and(|o| o.sufficient)) || (attempt.success && is_last);
            attempts.push(attempt);
            if accept {
                break;
            }
        }

        if attempts.iter().any(|a| a.success) {
            return finish(self.tag(), attempts, started, None);
        }

        let fallback = SpeedFirst.execute(scrapers, ctx, validator).await?;
        let mut metadata = fallback.metadata.unwrap_or_default();
        metadata.insert("adaptive_selection_failed".to_string(), "true".to_string());
        Ok(OrchestrationResult {
            metadata: Some(metadata),
            strategy_tag: self.tag(),
            ..fallback
        })
    }
}

/// Registry mapping strategy tag → implementation (spec §4.14).
pub struct StrategyRegistry {
    strategies: HashMap<StrategyTag, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn with_defaults() -> Self {
        let mut strategies: HashMap<StrategyTag, Arc<dyn Strategy>> = HashMap::new();
        strategies.insert(StrategyTag::SpeedFirst, Arc::new(SpeedFirst));
        strategies.insert(StrategyTag::QualityFirst, Arc::new(QualityFirst));
        strategies.insert(StrategyTag::CostFirst, Arc::new(CostFirst));
        strategies.insert(StrategyTag::Adaptive, Arc::new(Adaptive));
        Self { strategies }
    }

    pub fn get(&self, tag: StrategyTag) -> Option<&Arc<dyn Strategy>> {
        self.strategies.get(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spa_like_url_prefers_headless_first() {
        let order = Adaptive::tier_order_for("https://shop.example.com/product/42");
        assert_eq!(order[0], ScraperTier::SmartHeadless);
    }

    #[test]
    fn blog_like_url_prefers_http_first() {
        let order = Adaptive::tier_order_for("https://example.com/blog/my-article");
        assert_eq!(order[0], ScraperTier::Http);
    }

    #[test]
    fn fragment_spa_indicator_prefers_headless_first() {
        let order = Adaptive::tier_order_for("https://example.com/#!/app/home");
        assert_eq!(order[0], ScraperTier::SmartHeadless);
    }

    #[test]
    fn unrecognized_url_falls_back_to_speed_first_order() {
        let order = Adaptive::tier_order_for("https://example.com/");
        assert_eq!(order, vec![ScraperTier::Http, ScraperTier::SmartHeadless, ScraperTier::Headless]);
    }

    #[test]
    fn default_registry_has_all_four_strategies() {
        let registry = StrategyRegistry::with_defaults();
        assert!(registry.get(StrategyTag::SpeedFirst).is_some());
        assert!(registry.get(StrategyTag::QualityFirst).is_some());
        assert!(registry.get(StrategyTag::CostFirst).is_some());
        assert!(registry.get(StrategyTag::Adaptive).is_some());
    }
}
