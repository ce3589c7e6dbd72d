//! Rule-based extraction strategy: CSS selectors mapped to entity fields.
//! Grounded on the teacher's `riptide-html::css_extraction::CssJsonExtractor`
//! but adapted to the [`ExtractionStrategy`] contract and `ExtractedEntity`
//! shape (spec §3, §4.15).

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use scraper::{Html, Selector};
use trawl_types::extraction::{ExtractedEntity, ExtractionContext, ExtractionResult};

use crate::strategy::ExtractionStrategy;

/// Maps an entity type name to the CSS selectors used to populate its
/// fields, e.g. `{"product": {"name": ".product-title", "price": ".price"}}`.
pub struct RuleBasedStrategy {
    rules: HashMap<String, HashMap<String, String>>,
}

impl RuleBasedStrategy {
    pub fn new(rules: HashMap<String, HashMap<String, String>>) -> Self {
        Self { rules }
    }

    fn extract_entity(document: &Html, fields: &HashMap<String, String>) -> Option<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (field, selector_str) in fields {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            let values: Vec<String> = document
                .select(&selector)
                .map(|el| {
                    el.value()
                        .attr("content")
                        .map(str::to_string)
                        .unwrap_or_else(|| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
                })
                .filter(|s| !s.is_empty())
                .collect();
            if !values.is_empty() {
                let value = if values.len() == 1 {
                    serde_json::Value::String(values.into_iter().next().unwrap())
                } else {
                    serde_json::Value::Array(values.into_iter().map(serde_json::Value::String).collect())
                };
                out.insert(field.clone(), value);
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(out))
        }
    }
}

#[async_trait]
impl ExtractionStrategy for RuleBasedStrategy {
    fn tag(&self) -> &str {
        "rule_based"
    }

    async fn is_available(&self) -> bool {
        !self.rules.is_empty()
    }

    async fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        let start = Instant::now();
        let document = Html::parse_document(&ctx.html);

        let types_to_try: Vec<&String> = match &ctx.entity_types {
            Some(types) => types.iter().collect(),
            None => self.rules.keys().collect(),
        };

        let mut entities = Vec::new();
        for entity_type in types_to_try {
            let Some(fields) = self.rules.get(entity_type) else {
                continue;
            };
            if let Some(fields_value) = Self::extract_entity(&document, fields) {
                entities.push(ExtractedEntity {
                    entity_type: entity_type.clone(),
                    fields: fields_value,
                });
            }
        }

        let success = !entities.is_empty();
        ExtractionResult {
            entities,
            success,
            confidence: success.then_some(0.6),
            strategy_tag: self.tag().to_string(),
            execution_time_ms: start.elapsed().as_millis() as u64,
            error: (!success).then(|| "no configured selector matched any content".to_string()),
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> HashMap<String, HashMap<String, String>> {
        let mut product_fields = HashMap::new();
        product_fields.insert("name".to_string(), ".product-title".to_string());
        product_fields.insert("price".to_string(), ".price".to_string());
        let mut rules = HashMap::new();
        rules.insert("product".to_string(), product_fields);
        rules
    }

    #[tokio::test]
    async fn extracts_configured_selectors_into_entity_fields() {
        let strategy = RuleBasedStrategy::new(rules());
        let ctx = ExtractionContext {
            html: r#"<div class="product-title">Widget</div><span class="price">$9.99</span>"#
                .to_string(),
            markdown: String::new(),
            text: String::new(),
            url: "https://shop.example.com".to_string(),
            task_description: None,
            entity_types: None,
        };
        let result = strategy.extract(&ctx).await;
        assert!(result.success);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].entity_type, "product");
    }

    #[tokio::test]
    async fn fails_when_no_selector_matches() {
        let strategy = RuleBasedStrategy::new(rules());
        let ctx = ExtractionContext {
            html: "<div>nothing relevant</div>".to_string(),
            markdown: String::new(),
            text: String::new(),
            url: "https://shop.example.com".to_string(),
            task_description: None,
            entity_types: None,
        };
        let result = strategy.extract(&ctx).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn unavailable_with_no_configured_rules() {
        let strategy = RuleBasedStrategy::new(HashMap::new());
        assert!(!strategy.is_available().await);
    }
}
