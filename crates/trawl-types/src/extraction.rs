//! Entity-extraction types (spec §3: ExtractionContext, ExtractionResult).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input to an extraction strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionContext {
    pub html: String,
    pub markdown: String,
    pub text: String,
    pub url: String,
    pub task_description: Option<String>,
    pub entity_types: Option<Vec<String>>,
}

/// A single extracted entity. Shape is intentionally open (`serde_json::Value`
/// fields) since entity schemas are task-defined, not fixed by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub entity_type: String,
    pub fields: serde_json::Value,
}

/// Output of running one extraction strategy (spec §3: ExtractionResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<ExtractedEntity>,
    pub success: bool,
    pub confidence: Option<f64>,
    pub strategy_tag: String,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl ExtractionResult {
    pub fn failure(strategy_tag: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            entities: Vec::new(),
            success: false,
            confidence: None,
            strategy_tag: strategy_tag.into(),
            execution_time_ms: 0,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Synthetic failure emitted when every registered strategy has been
    /// exhausted without success (spec §4.15).
    pub fn all_strategies_failed() -> Self {
        Self::failure("none", "All extraction strategies failed")
    }
}

/// Outcome of the Content Validator's quality judgment (spec §4.13).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub quality_score: f64,
    pub sufficient: bool,
    pub reason: String,
    pub needs_interaction: bool,
    pub suggested_actions: Vec<String>,
}

impl ValidationOutcome {
    /// Fail-open default used when the validator itself errors (spec §4.13, §7).
    pub fn fail_open() -> Self {
        Self {
            quality_score: 0.5,
            sufficient: true,
            reason: "validation failed, assuming sufficient".to_string(),
            needs_interaction: false,
            suggested_actions: Vec::new(),
        }
    }
}
