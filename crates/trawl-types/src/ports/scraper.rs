//! Scraper adapter contract (spec §6): the one interface every external
//! scraper (HTTP fetcher, headless browser driver, reader service, ...) must
//! satisfy. These adapters are Non-goals of this spec — only the contract
//! lives here.

use crate::error::Result;
use crate::scrape::{JobOptions, ScrapedResult};
use async_trait::async_trait;

/// A callback used by a scraper to report progress before it has finished.
#[async_trait]
pub trait ProgressEmitter: Send + Sync {
    async fn emit(&self, message: &str, progress: u8);
}

#[async_trait]
pub trait ScraperPort: Send + Sync {
    async fn scrape(
        &self,
        url: &str,
        job_id: &str,
        options: &JobOptions,
        emit_progress: &dyn ProgressEmitter,
    ) -> Result<ScrapedResult>;
}
