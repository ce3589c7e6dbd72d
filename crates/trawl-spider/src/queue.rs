//! BFS crawl queue: FIFO ordering plus a URL presence set (spec §4.3).

use std::collections::{HashSet, VecDeque};

use trawl_types::crawl::{CrawlConfig, CrawlPage};

/// Invariant: `present` is exactly the set of URLs currently held in
/// `order`. Visited URLs are tracked elsewhere (`DuplicateDetector`), not
/// here — a dequeued page's URL slot is released immediately.
#[derive(Debug)]
pub struct CrawlQueue {
    order: VecDeque<CrawlPage>,
    present: HashSet<String>,
    /// `None` means unbounded. Populated from `CrawlConfig::max_pages` by
    /// `from_config`, since `enqueue` alone has no notion of pages already
    /// dequeued/visited — the driver is responsible for keeping `capacity`
    /// in step with however it counts "pages" for spec §8's "at capacity"
    /// boundary (here: queue length, not cumulative visits).
    capacity: Option<usize>,
}

impl Default for CrawlQueue {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            present: HashSet::new(),
            capacity: None,
        }
    }
}

impl CrawlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the queue at `capacity` entries; further `enqueue` calls beyond
    /// that are silently refused (spec §8: "Crawl queue at capacity refuses
    /// further enqueues silently").
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Bound the queue by `config.max_pages` (spec §4.3 wired to §3's
    /// `CrawlConfig`).
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::with_capacity(config.max_pages)
    }

    /// No-op if `page.url` is already present in the queue, or if the queue
    /// is already at its configured capacity.
    pub fn enqueue(&mut self, page: CrawlPage) {
        if self.present.contains(&page.url) {
            return;
        }
        if let Some(cap) = self.capacity {
            if self.order.len() >= cap {
                return;
            }
        }
        self.present.insert(page.url.clone());
        self.order.push_back(page);
    }

    /// Removes and returns the head, releasing its URL slot.
    pub fn dequeue(&mut self) -> Option<CrawlPage> {
        let page = self.order.pop_front()?;
        self.present.remove(&page.url);
        Some(page)
    }

    /// Non-destructive look at the head.
    pub fn peek(&self) -> Option<&CrawlPage> {
        self.order.front()
    }

    pub fn get_by_depth(&self, depth: u32) -> Vec<&CrawlPage> {
        self.order.iter().filter(|p| p.depth == depth).collect()
    }

    /// O(n) removal of a specific URL, wherever it sits in the queue.
    pub fn remove_url(&mut self, url: &str) -> bool {
        if !self.present.remove(url) {
            return false;
        }
        if let Some(idx) = self.order.iter().position(|p| p.url == url) {
            self.order.remove(idx);
        }
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.present.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(url: &str) -> CrawlPage {
        CrawlPage::seed(url, Utc::now())
    }

    #[test]
    fn enqueue_then_dequeue_is_fifo() {
        let mut q = CrawlQueue::new();
        q.enqueue(page("https://example.com/a"));
        q.enqueue(page("https://example.com/b"));
        assert_eq!(q.dequeue().unwrap().url, "https://example.com/a");
        assert_eq!(q.dequeue().unwrap().url, "https://example.com/b");
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn enqueue_duplicate_url_is_a_no_op() {
        let mut q = CrawlQueue::new();
        q.enqueue(page("https://example.com/a"));
        q.enqueue(page("https://example.com/a"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn dequeue_releases_the_url_slot() {
        let mut q = CrawlQueue::new();
        q.enqueue(page("https://example.com/a"));
        q.dequeue();
        assert!(!q.contains("https://example.com/a"));
        q.enqueue(page("https://example.com/a"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut q = CrawlQueue::new();
        q.enqueue(page("https://example.com/a"));
        assert_eq!(q.peek().unwrap().url, "https://example.com/a");
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_url_finds_entries_anywhere_in_queue() {
        let mut q = CrawlQueue::new();
        q.enqueue(page("https://example.com/a"));
        q.enqueue(page("https://example.com/b"));
        q.enqueue(page("https://example.com/c"));
        assert!(q.remove_url("https://example.com/b"));
        assert_eq!(q.len(), 2);
        assert!(!q.contains("https://example.com/b"));
    }

    #[test]
    fn enqueue_at_capacity_is_silently_refused() {
        let mut q = CrawlQueue::with_capacity(2);
        q.enqueue(page("https://example.com/a"));
        q.enqueue(page("https://example.com/b"));
        q.enqueue(page("https://example.com/c"));
        assert_eq!(q.len(), 2);
        assert!(!q.contains("https://example.com/c"));
    }

    #[test]
    fn from_config_uses_max_pages_as_capacity() {
        let config = CrawlConfig {
            max_pages: 1,
            ..Default::default()
        };
        let mut q = CrawlQueue::from_config(&config);
        q.enqueue(page("https://example.com/a"));
        q.enqueue(page("https://example.com/b"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn get_by_depth_filters() {
        let mut q = CrawlQueue::new();
        let seed = page("https://example.com/a");
        let child = CrawlPage::child("https://example.com/b", &seed, 0, Utc::now());
        q.enqueue(seed);
        q.enqueue(child);
        assert_eq!(q.get_by_depth(1).len(), 1);
        assert_eq!(q.get_by_depth(0).len(), 1);
    }
}
