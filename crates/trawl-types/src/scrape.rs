//! Scrape results, processed content, caching, and job-lifecycle types
//! (spec §3: ScrapedResult, ProcessedContent, CacheEntry<T>; §6: job surface).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MIN_CONTENT_TEXT_LEN: usize = 200;
pub const MIN_CONTENT_HTML_LEN: usize = 500;

/// Raw output of a single scraper tier invocation (spec §3: ScrapedResult).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedResult {
    pub html: String,
    pub markdown: String,
    pub text: String,
    pub page_title: Option<String>,
    pub page_description: Option<String>,
    pub final_url: Option<String>,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub screenshots: Vec<String>,
    pub request_count: u32,
    pub from_cache: bool,
}

impl ScrapedResult {
    /// "content-present" per spec §3: text-length≥MIN_LEN or html-length≥500.
    pub fn is_content_present(&self) -> bool {
        self.text.len() >= MIN_CONTENT_TEXT_LEN || self.html.len() >= MIN_CONTENT_HTML_LEN
    }
}

/// A single named processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    MarkupProcessing,
    MarkdownConversion,
    TextExtraction,
}

/// An error recorded against a stage without aborting the pipeline (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: PipelineStage,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkupStats {
    pub original_len: usize,
    pub clean_len: usize,
    pub main_len: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub original_len: usize,
    pub processed_len: usize,
}

/// Metadata accumulated by the Processing Pipeline (spec §3: ProcessedContent.metadata).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub stages_executed: Vec<PipelineStage>,
    pub execution_time_ms: u64,
    pub per_stage_timings: HashMap<PipelineStage, u64>,
    pub errors: Vec<StageError>,
    pub markup_stats: MarkupStats,
    pub text_stats: TextStats,
}

/// Output of the Processing Pipeline (spec §3: ProcessedContent).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedContent {
    pub raw_markup: String,
    pub clean_markup: String,
    pub main_content: Option<String>,
    pub markdown: String,
    pub text: String,
    pub metadata: ProcessingMetadata,
}

/// A cached value plus its lifecycle metadata (spec §3: CacheEntry<T>).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, created_at: DateTime<Utc>, ttl_secs: Option<u64>) -> Self {
        let expires_at = ttl_secs.map(|s| created_at + chrono::Duration::seconds(s as i64));
        Self {
            value,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expires_at.map(|exp| exp - now)
    }
}

/// Result of a cache lookup (spec §4.9: `{data, from_cache, remaining_ttl}`).
#[derive(Debug, Clone)]
pub struct CacheLookup<T> {
    pub data: Option<T>,
    pub from_cache: bool,
    pub remaining_ttl: Option<chrono::Duration>,
}

/// Named scraper tiers. Kept distinct per spec §9 Open Question (c): the
/// adaptive strategy never overloads a single `Headless` tag for both the
/// "smart" (JS-rendering aware) and "standard" headless attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScraperTier {
    Auto,
    Http,
    Reader,
    Headless,
    SmartHeadless,
    Cheerio,
    AiAgent,
}

impl std::fmt::Display for ScraperTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Job lifecycle state (spec §4.16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Cancellation is a state transition valid only from `queued` or `running` (spec §5).
    pub fn can_cancel(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

/// Options accompanying a job request (spec §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOptions {
    pub use_proxy: bool,
    pub block_resources: bool,
    pub include_screenshots: bool,
    pub session_bundle: Option<String>,
}

/// A progress notification emitted on every job state transition and tier
/// boundary (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
    /// 0..=100
    pub progress: u8,
    /// Present only on the final event for a job.
    pub final_record: Option<serde_json::Value>,
}

/// Inbound job-creation request (spec §6): `(url, task_description?,
/// scraper_tier?, options)`. `scraper_tier` defaults to `AUTO`, letting the
/// Orchestrator pick a strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    pub url: String,
    pub task_description: Option<String>,
    pub scraper_tier: Option<ScraperTier>,
    pub options: JobOptions,
    pub entity_types: Option<Vec<String>>,
}

/// The Scrape Service's exclusively-owned record of one job (spec §3: "the
/// Scrape Service exclusively owns a Job's lifetime and mutates it").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub url: String,
    pub task_description: Option<String>,
    pub requested_tier: ScraperTier,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<ScrapedResult>,
    pub extraction: Option<crate::extraction::ExtractionResult>,
    pub error: Option<String>,
    pub from_cache: bool,
}

impl JobRecord {
    pub fn new(job_id: impl Into<String>, request: &JobRequest, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            url: request.url.clone(),
            task_description: request.task_description.clone(),
            requested_tier: request.scraper_tier.unwrap_or(ScraperTier::Auto),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            result: None,
            extraction: None,
            error: None,
            from_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_present_on_text_length() {
        let r = ScrapedResult {
            text: "x".repeat(MIN_CONTENT_TEXT_LEN),
            ..Default::default()
        };
        assert!(r.is_content_present());
    }

    #[test]
    fn content_present_on_html_length() {
        let r = ScrapedResult {
            html: "x".repeat(MIN_CONTENT_HTML_LEN),
            ..Default::default()
        };
        assert!(r.is_content_present());
    }

    #[test]
    fn content_absent_below_both_thresholds() {
        let r = ScrapedResult {
            text: "short".into(),
            html: "<p>short</p>".into(),
            ..Default::default()
        };
        assert!(!r.is_content_present());
    }

    #[test]
    fn cache_entry_expiry() {
        let now = Utc::now();
        let entry = CacheEntry::new("value".to_string(), now, Some(1));
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + chrono::Duration::seconds(2)));
    }

    #[test]
    fn only_queued_or_running_can_cancel() {
        assert!(JobStatus::Queued.can_cancel());
        assert!(JobStatus::Running.can_cancel());
        assert!(!JobStatus::Completed.can_cancel());
        assert!(!JobStatus::Cancelled.can_cancel());
    }

    #[test]
    fn new_job_record_starts_queued_with_requested_tier() {
        let request = JobRequest {
            url: "https://example.com".to_string(),
            scraper_tier: Some(ScraperTier::Http),
            ..Default::default()
        };
        let now = Utc::now();
        let record = JobRecord::new("job-1", &request, now);
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.requested_tier, ScraperTier::Http);
        assert!(record.result.is_none());
    }

    #[test]
    fn unrequested_tier_defaults_to_auto() {
        let request = JobRequest {
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        let record = JobRecord::new("job-2", &request, Utc::now());
        assert_eq!(record.requested_tier, ScraperTier::Auto);
    }
}
