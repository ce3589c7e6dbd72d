//! Scraper Orchestrator and Scrape Service: the tiered escalation strategies,
//! their shared harness, content validation, and the end-to-end job driver
//! that ties every other crate together (spec §4.13–§4.16).

pub mod harness;
pub mod service;
pub mod strategies;
pub mod validator;

pub use harness::{is_content_present, run_tier, AttemptContext};
pub use service::ScrapeService;
pub use strategies::{Adaptive, CostFirst, QualityFirst, ScraperRegistry, SpeedFirst, Strategy, StrategyRegistry};
pub use validator::ContentValidator;
