//! Crawl-graph engine: URL normalization, duplicate detection, the BFS crawl
//! queue, link/AJAX/frame discovery, and crawl statistics (spec §4.1–§4.4).

pub mod duplicates;
pub mod links;
pub mod queue;
pub mod sitemap;
pub mod stats;
pub mod url_normalizer;

pub use duplicates::DuplicateDetector;
pub use links::{discover_ajax_endpoints, discover_frames, discover_links};
pub use queue::CrawlQueue;
pub use sitemap::parse_sitemap;
pub use stats::StatsTracker;
pub use url_normalizer::{normalize, same_domain, should_follow};
