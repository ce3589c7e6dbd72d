//! Scrape Service (spec §4.16): the end-to-end job driver tying every other
//! component together. Ownership follows spec §3 — this is the only thing
//! that mutates a [`JobRecord`] across its lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use trawl_cache::CacheManager;
use trawl_reliability::{CircuitBreakerRegistry, RateLimiter};
use trawl_session::SessionStore;
use trawl_types::config::{CacheMode, TrawlConfig};
use trawl_types::error::{backoff_delay, Result, TrawlError};
use trawl_types::extraction::ExtractionContext;
use trawl_types::orchestration::StrategyTag;
use trawl_types::ports::scraper::ProgressEmitter;
use trawl_types::ports::ProgressSink;
use trawl_types::scrape::{JobOptions, JobRecord, JobRequest, JobStatus, ProgressEvent, ScrapedResult, ScraperTier};

use crate::harness::{run_tier, AttemptContext};
use crate::strategies::{ScraperRegistry, StrategyRegistry};
use crate::validator::ContentValidator;

const MIN_RAW_HTML_LEN: usize = 100;

/// Forwards per-tier scraper progress into the job-level [`ProgressSink`].
struct SinkProgressEmitter {
    sink: Arc<dyn ProgressSink>,
    job_id: String,
}

#[async_trait::async_trait]
impl ProgressEmitter for SinkProgressEmitter {
    async fn emit(&self, message: &str, progress: u8) {
        self.sink
            .emit(ProgressEvent {
                job_id: self.job_id.clone(),
                status: JobStatus::Running,
                message: message.to_string(),
                progress,
                final_record: None,
            })
            .await;
    }
}

pub struct ScrapeService {
    config: TrawlConfig,
    cache: Arc<CacheManager>,
    rate_limiter: Arc<RateLimiter>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    session_store: Option<Arc<SessionStore>>,
    scrapers: Arc<ScraperRegistry>,
    strategies: Arc<StrategyRegistry>,
    validator: Arc<ContentValidator>,
    extraction: Arc<trawl_extraction::ExtractionManager>,
    progress: Arc<dyn ProgressSink>,
    cancel_flags: DashMap<String, Arc<AtomicBool>>,
}

impl ScrapeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: TrawlConfig,
        cache: Arc<CacheManager>,
        rate_limiter: Arc<RateLimiter>,
        circuit_breakers: Arc<CircuitBreakerRegistry>,
        session_store: Option<Arc<SessionStore>>,
        scrapers: Arc<ScraperRegistry>,
        strategies: Arc<StrategyRegistry>,
        validator: Arc<ContentValidator>,
        extraction: Arc<trawl_extraction::ExtractionManager>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            cache,
            rate_limiter,
            circuit_breakers,
            session_store,
            scrapers,
            strategies,
            validator,
            extraction,
            progress,
            cancel_flags: DashMap::new(),
        }
    }

    /// Request cancellation of `job_id`. Returns `true` if a running job was
    /// found and flagged; the job itself observes the flag at its next
    /// suspension point (spec §5).
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.cancel_flags.get(job_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    async fn emit(&self, job_id: &str, status: JobStatus, message: impl Into<String>, progress: u8, final_record: Option<&JobRecord>) {
        self.progress
            .emit(ProgressEvent {
                job_id: job_id.to_string(),
                status,
                message: message.into(),
                progress,
                final_record: final_record.and_then(|r| serde_json::to_value(r).ok()),
            })
            .await;
    }

    /// Runs one job end to end (spec §4.16): cache → fetch → validate →
    /// cache-write → extract → persist, with retries and non-retryable
    /// short-circuiting per spec §7.
    pub async fn run(&self, request: JobRequest) -> JobRecord {
        let job_id = uuid::Uuid::new_v4().to_string();
        let mut record = JobRecord::new(&job_id, &request, Utc::now());
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags.insert(job_id.clone(), cancel_flag.clone());

        self.emit(&job_id, JobStatus::Queued, "job queued", 0, None).await;
        record.status = JobStatus::Running;
        record.updated_at = Utc::now();
        self.emit(&job_id, JobStatus::Running, "job started", 5, None).await;

        let mut attempt = 0u32;
        loop {
            if cancel_flag.load(Ordering::SeqCst) {
                record.status = JobStatus::Cancelled;
                record.updated_at = Utc::now();
                self.emit(&job_id, JobStatus::Cancelled, "job cancelled", 100, Some(&record)).await;
                self.cancel_flags.remove(&job_id);
                return record;
            }

            match self.run_once(&job_id, &request, &mut record, &cancel_flag).await {
                Ok(()) => {
                    record.status = JobStatus::Completed;
                    record.updated_at = Utc::now();
                    self.emit(&job_id, JobStatus::Completed, "job completed", 100, Some(&record)).await;
                    break;
                }
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.config.max_retries {
                        record.status = JobStatus::Failed;
                        record.error = Some(err.to_string());
                        record.updated_at = Utc::now();
                        self.emit(&job_id, JobStatus::Failed, err.to_string(), 100, Some(&record)).await;
                        break;
                    }
                    self.emit(
                        &job_id,
                        JobStatus::Running,
                        format!("attempt {attempt} failed, retrying: {err}"),
                        10,
                        None,
                    )
                    .await;
                    let delay = err.retry_after().unwrap_or_else(|| {
                        backoff_delay(self.config.retry_backoff_base_ms, attempt, || {
                            std::time::Duration::from_millis(fastrand::u64(0..1000))
                        })
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }

        self.cancel_flags.remove(&job_id);
        record
    }

    async fn run_once(
        &self,
        job_id: &str,
        request: &JobRequest,
        record: &mut JobRecord,
        cancel_flag: &Arc<AtomicBool>,
    ) -> Result<()> {
        let requested_tier = request.scraper_tier.unwrap_or(ScraperTier::Auto);
        let tag_for_key = format!("{requested_tier}");
        let cache_key = trawl_cache::scrape_key(&request.url, &tag_for_key, request.task_description.as_deref());

        if !matches!(self.config.cache_mode, CacheMode::Disabled | CacheMode::Bypass) {
            let lookup = self.cache.get::<ScrapedResult>(&cache_key).await?;
            if let Some(mut cached) = lookup.data {
                cached.from_cache = true;
                record.result = Some(cached);
                record.from_cache = true;
                return Ok(());
            }
        }

        let domain = url::Url::parse(&request.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| request.url.clone());

        let decision = self.rate_limiter.check(&domain).await;
        if !decision.allowed {
            return Err(TrawlError::RateLimited(format!("rate limit exceeded for {domain}")));
        }

        if let Some(bundle) = &request.options.session_bundle {
            let store = self
                .session_store
                .as_ref()
                .ok_or_else(|| TrawlError::AuthRequired(format!("no session store configured for {domain}")))?;
            let session = store.load(&domain, Some(bundle)).await?;
            if session.is_none() {
                return Err(TrawlError::AuthRequired(format!(
                    "{domain} requires an authenticated session; none found for bundle '{bundle}'. \
                     Provision a session via the Session Store before scraping this host."
                )));
            }
        }

        if cancel_flag.load(Ordering::SeqCst) {
            return Err(TrawlError::Custom("cancelled".to_string()));
        }

        let scrape_cb = self.circuit_breakers.get_or_create(&format!("scraper:{domain}")).await;
        scrape_cb.try_call().await?;

        let progress_emitter = SinkProgressEmitter {
            sink: Arc::clone(&self.progress),
            job_id: job_id.to_string(),
        };
        let ctx = AttemptContext {
            url: &request.url,
            job_id,
            options: &request.options,
            progress: &progress_emitter,
            task_description: request.task_description.as_deref(),
            page_title_hint: None,
        };

        let result = match requested_tier {
            ScraperTier::Auto => {
                let strategy_tag = self.config_default_strategy_tag();
                let strategy = self
                    .strategies
                    .get(strategy_tag)
                    .ok_or_else(|| TrawlError::Configuration(format!("no strategy registered for {strategy_tag}")))?;
                match strategy.execute(&self.scrapers, &ctx, &self.validator).await {
                    Ok(outcome) => {
                        scrape_cb.on_success().await;
                        outcome.final_result
                    }
                    Err(err) => {
                        scrape_cb.on_failure().await;
                        return Err(err);
                    }
                }
            }
            tier => {
                let scraper = self
                    .scrapers
                    .get(tier)
                    .ok_or_else(|| TrawlError::Configuration(format!("no scraper registered for tier {tier}")))?;
                let (attempt, _outcome) = run_tier(tier, scraper.as_ref(), &ctx, &self.validator).await;
                match attempt.result {
                    Some(result) if attempt.success => {
                        scrape_cb.on_success().await;
                        result
                    }
                    _ => {
                        scrape_cb.on_failure().await;
                        return Err(TrawlError::Unknown(attempt.error.unwrap_or_else(|| "scrape failed".to_string())));
                    }
                }
            }
        };

        if result.html.len() < MIN_RAW_HTML_LEN {
            return Err(TrawlError::ParseError(format!(
                "scraped payload below minimum length ({} < {MIN_RAW_HTML_LEN} bytes)",
                result.html.len()
            )));
        }

        if !matches!(self.config.cache_mode, CacheMode::Disabled | CacheMode::ReadOnly) {
            let _ = self.cache.set(&cache_key, &result, Some(self.config.cache_ttl_s)).await;
        }

        record.result = Some(result.clone());
        record.from_cache = false;

        if let Some(task_description) = &request.task_description {
            let extraction_cb = self.circuit_breakers.get_or_create("ai_extraction").await;
            if extraction_cb.try_call().await.is_ok() {
                let extraction_ctx = ExtractionContext {
                    html: result.html.clone(),
                    markdown: result.markdown.clone(),
                    text: result.text.clone(),
                    url: request.url.clone(),
                    task_description: Some(task_description.clone()),
                    entity_types: request.entity_types.clone(),
                };
                let extraction_result = self.extraction.extract_with_fallback(&extraction_ctx, &["llm"]).await;
                if extraction_result.success {
                    extraction_cb.on_success().await;
                } else {
                    extraction_cb.on_failure().await;
                }
                record.extraction = Some(extraction_result);
            }
        }

        Ok(())
    }

    fn config_default_strategy_tag(&self) -> StrategyTag {
        match self.config.default_strategy {
            trawl_types::config::DefaultStrategy::SpeedFirst => StrategyTag::SpeedFirst,
            trawl_types::config::DefaultStrategy::QualityFirst => StrategyTag::QualityFirst,
            trawl_types::config::DefaultStrategy::CostFirst => StrategyTag::CostFirst,
            trawl_types::config::DefaultStrategy::Adaptive => StrategyTag::Adaptive,
        }
    }
}
