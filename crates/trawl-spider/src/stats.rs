//! Rolling crawl statistics (spec §3: `CrawlStats`).

use std::time::Duration;

use trawl_types::crawl::CrawlStats;

/// Accumulates `CrawlStats` counters as a crawl run progresses. Average page
/// time is maintained incrementally rather than recomputed from a stored
/// history, matching the rest of the crate's preference for O(1) updates.
#[derive(Debug, Default)]
pub struct StatsTracker {
    stats: CrawlStats,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_visit(&mut self, depth: u32, page_time: Duration) {
        let prior_visited = self.stats.pages_visited;
        self.stats.pages_visited += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);
        self.stats.total_time += page_time;

        let total_pages = prior_visited + self.stats.pages_skipped + self.stats.pages_failed + 1;
        if total_pages > 0 {
            self.stats.average_page_time = self.stats.total_time / total_pages as u32;
        }
    }

    pub fn record_skip(&mut self) {
        self.stats.pages_skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.stats.pages_failed += 1;
    }

    pub fn record_ajax_fetch(&mut self) {
        self.stats.ajax_endpoints_fetched += 1;
    }

    pub fn record_links_discovered(&mut self, count: u64) {
        self.stats.links_discovered += count;
    }

    pub fn record_duplicate(&mut self) {
        self.stats.duplicates_detected += 1;
    }

    pub fn snapshot(&self) -> CrawlStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_visit_updates_counters_and_depth() {
        let mut tracker = StatsTracker::new();
        tracker.record_visit(2, Duration::from_millis(100));
        tracker.record_visit(1, Duration::from_millis(300));
        let snap = tracker.snapshot();
        assert_eq!(snap.pages_visited, 2);
        assert_eq!(snap.max_depth_reached, 2);
        assert_eq!(snap.total_time, Duration::from_millis(400));
        assert_eq!(snap.average_page_time, Duration::from_millis(200));
    }

    #[test]
    fn success_rate_reflects_failures() {
        let mut tracker = StatsTracker::new();
        tracker.record_visit(0, Duration::from_millis(1));
        tracker.record_failure();
        let snap = tracker.snapshot();
        assert!((snap.success_rate() - 0.5).abs() < f64::EPSILON);
    }
}
