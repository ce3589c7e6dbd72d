//! Common harness shared by every strategy (spec §4.14): runs one scraper
//! tier, times it, applies the harness-level content-present check, and
//! validates only content-present attempts.

use std::time::Instant;

use trawl_types::extraction::ValidationOutcome;
use trawl_types::orchestration::OrchestrationAttempt;
use trawl_types::ports::scraper::ProgressEmitter;
use trawl_types::ports::ScraperPort;
use trawl_types::scrape::{JobOptions, ScrapedResult, ScraperTier};

use crate::validator::ContentValidator;

/// Harness-level "content-present" check (spec §4.14): looser than
/// [`ScrapedResult::is_content_present`] — text over 100 chars, or any of
/// html/text/markdown non-empty.
pub fn is_content_present(result: &ScrapedResult) -> bool {
    result.text.len() > 100 || !result.html.is_empty() || !result.text.is_empty() || !result.markdown.is_empty()
}

/// Inputs shared by every tier attempt within one strategy run.
pub struct AttemptContext<'a> {
    pub url: &'a str,
    pub job_id: &'a str,
    pub options: &'a JobOptions,
    pub progress: &'a dyn ProgressEmitter,
    pub task_description: Option<&'a str>,
    pub page_title_hint: Option<&'a str>,
}

/// Runs a single tier end to end and returns the spec-shaped attempt record
/// plus the full validation outcome (when the attempt was validated), so
/// strategies can apply their own per-tier quality thresholds on top of the
/// validator's own `sufficient` judgment.
pub async fn run_tier(
    tier: ScraperTier,
    scraper: &dyn ScraperPort,
    ctx: &AttemptContext<'_>,
    validator: &ContentValidator,
) -> (OrchestrationAttempt, Option<ValidationOutcome>) {
    let start = Instant::now();
    ctx.progress.emit(&format!("trying {tier} scraper"), 0).await;

    let scrape_outcome = scraper.scrape(ctx.url, ctx.job_id, ctx.options, ctx.progress).await;
    let execution_time_ms = start.elapsed().as_millis() as u64;

    let result = match scrape_outcome {
        Ok(result) => result,
        Err(err) => {
            let attempt = OrchestrationAttempt {
                scraper_tag: tier,
                success: false,
                result: None,
                execution_time_ms,
                error: Some(err.to_string()),
                quality_score: None,
                validation_reason: None,
            };
            return (attempt, None);
        }
    };

    if !is_content_present(&result) {
        let attempt = OrchestrationAttempt {
            scraper_tag: tier,
            success: true,
            result: Some(result),
            execution_time_ms,
            error: None,
            quality_score: None,
            validation_reason: None,
        };
        return (attempt, None);
    }

    let outcome = validator
        .validate(trawl_types::ports::validator::ValidationRequest {
            html: &result.html,
            text: &result.text,
            markdown: &result.markdown,
            url: ctx.url,
            task_description: ctx.task_description,
            page_title: ctx.page_title_hint.or(result.page_title.as_deref()),
        })
        .await;

    let attempt = OrchestrationAttempt {
        scraper_tag: tier,
        success: true,
        result: Some(result),
        execution_time_ms,
        error: None,
        quality_score: Some(outcome.quality_score),
        validation_reason: Some(outcome.reason.clone()),
    };
    (attempt, Some(outcome))
}
