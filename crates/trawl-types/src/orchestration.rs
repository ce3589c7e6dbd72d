//! Orchestrator attempt/result types (spec §3, §4.14) and the four strategies.

use crate::scrape::{ScrapedResult, ScraperTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the four named escalation policies (spec §4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    SpeedFirst,
    QualityFirst,
    CostFirst,
    Adaptive,
}

impl std::fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StrategyTag::SpeedFirst => "speed_first",
            StrategyTag::QualityFirst => "quality_first",
            StrategyTag::CostFirst => "cost_first",
            StrategyTag::Adaptive => "adaptive",
        };
        write!(f, "{s}")
    }
}

/// A single scraper-tier attempt within a strategy run (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationAttempt {
    pub scraper_tag: ScraperTier,
    pub success: bool,
    pub result: Option<ScrapedResult>,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub quality_score: Option<f64>,
    pub validation_reason: Option<String>,
}

/// The outcome of running a full strategy over a URL (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub final_result: ScrapedResult,
    pub scraper_that_won: ScraperTier,
    pub attempts: Vec<OrchestrationAttempt>,
    pub total_time_ms: u64,
    pub strategy_tag: StrategyTag,
    pub metadata: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tag_display_matches_snake_case() {
        assert_eq!(StrategyTag::SpeedFirst.to_string(), "speed_first");
        assert_eq!(StrategyTag::Adaptive.to_string(), "adaptive");
    }
}
