//! Data model for the crawl-graph engine (spec §3: CrawlPage, CrawlConfig, CrawlStats).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status of a single page in a crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Pending,
    Visited,
    Skipped,
    Failed,
}

/// A single node in the crawl graph, identified by its normalized URL.
///
/// Invariants (spec §3): a URL appears at most once across queue and
/// visited-set combined; `depth` of a discovered child is `parent.depth + 1`;
/// once visited a page is never re-enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPage {
    pub url: String,
    pub depth: u32,
    pub parent_url: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub visited_at: Option<DateTime<Utc>>,
    pub status: PageStatus,
    pub error: Option<String>,
    /// Higher priority is dequeued/ranked earlier.
    pub priority: i32,
}

impl CrawlPage {
    pub fn seed(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            parent_url: None,
            discovered_at: now,
            visited_at: None,
            status: PageStatus::Pending,
            error: None,
            priority: 0,
        }
    }

    pub fn child(
        url: impl Into<String>,
        parent: &CrawlPage,
        priority: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            depth: parent.depth + 1,
            parent_url: Some(parent.url.clone()),
            discovered_at: now,
            visited_at: None,
            status: PageStatus::Pending,
            error: None,
            priority,
        }
    }
}

/// Crawl-run configuration (spec §3: CrawlConfig).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub max_depth: u32,
    pub max_ajax_endpoints: usize,
    pub follow_external_links: bool,
    /// Empty means "same as seed domain".
    pub allowed_domains: Vec<String>,
    /// Regex patterns; an invalid pattern is ignored (never rejects a page).
    pub blocked_patterns: Vec<String>,
    pub respect_robots: bool,
    pub delay_between_requests_ms: u64,
    pub timeout_ms: u64,
    /// Supplemental (SPEC_FULL §4 sitemap addition): seed the queue from an
    /// XML sitemap in addition to in-page link discovery. Off by default.
    pub seed_from_sitemap: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 3,
            max_ajax_endpoints: 20,
            follow_external_links: false,
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            respect_robots: true,
            delay_between_requests_ms: 0,
            timeout_ms: 30_000,
            seed_from_sitemap: false,
        }
    }
}

/// Rolling counters and timings for a crawl run (spec §3: CrawlStats).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_visited: u64,
    pub pages_skipped: u64,
    pub pages_failed: u64,
    pub ajax_endpoints_fetched: u64,
    pub links_discovered: u64,
    pub duplicates_detected: u64,
    pub max_depth_reached: u32,
    #[serde(with = "duration_millis")]
    pub total_time: Duration,
    #[serde(with = "duration_millis")]
    pub average_page_time: Duration,
}

impl CrawlStats {
    /// `success_rate = visited / (visited + failed)`, redefined precisely by
    /// spec §9 Open Question (b). Zero attempts yields `1.0` (vacuously
    /// successful, nothing to divide by).
    pub fn success_rate(&self) -> f64 {
        let denom = self.pages_visited + self.pages_failed;
        if denom == 0 {
            1.0
        } else {
            self.pages_visited as f64 / denom as f64
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_visited_over_visited_plus_failed() {
        let stats = CrawlStats {
            pages_visited: 8,
            pages_failed: 2,
            ..Default::default()
        };
        assert!((stats.success_rate() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_vacuous_when_no_attempts() {
        assert_eq!(CrawlStats::default().success_rate(), 1.0);
    }

    #[test]
    fn child_depth_is_parent_depth_plus_one() {
        let now = Utc::now();
        let parent = CrawlPage::seed("https://example.com", now);
        let child = CrawlPage::child("https://example.com/x", &parent, 1, now);
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_url.as_deref(), Some("https://example.com"));
    }
}
