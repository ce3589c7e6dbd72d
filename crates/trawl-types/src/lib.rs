//! Shared data model, error taxonomy, and port traits for the Trawl engine.
//!
//! This crate carries no behavior of its own beyond small invariant-preserving
//! constructors. Every other `trawl-*` crate depends on it for the types that
//! cross crate boundaries and for the `ports` traits that decouple the core
//! from its external collaborators (fetchers, browsers, LLM clients, job
//! stores, event buses).

pub mod config;
pub mod crawl;
pub mod error;
pub mod extraction;
pub mod orchestration;
pub mod ports;
pub mod scrape;
pub mod session;

pub use config::TrawlConfig;
pub use error::{Result, TrawlError};
