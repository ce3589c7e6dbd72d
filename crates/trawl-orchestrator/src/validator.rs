//! Content Validator (spec §4.13): wraps the external [`ValidatorPort`]
//! (the AI quality check is a Non-goal/external collaborator) with fail-open
//! semantics and result caching keyed on a fingerprint of `(text,
//! task_description)`.

use std::sync::Arc;

use trawl_cache::CacheManager;
use trawl_types::extraction::ValidationOutcome;
use trawl_types::ports::validator::ValidationRequest;
use trawl_types::ports::ValidatorPort;

pub struct ContentValidator {
    backend: Arc<dyn ValidatorPort>,
    cache: Arc<CacheManager>,
    cache_ttl_secs: Option<u64>,
}

impl ContentValidator {
    pub fn new(backend: Arc<dyn ValidatorPort>, cache: Arc<CacheManager>, cache_ttl_secs: Option<u64>) -> Self {
        Self {
            backend,
            cache,
            cache_ttl_secs,
        }
    }

    pub async fn validate(&self, request: ValidationRequest<'_>) -> ValidationOutcome {
        let cache_key = format!(
            "validation:{}",
            trawl_cache::validation_fingerprint(request.text, request.task_description)
        );

        if let Ok(lookup) = self.cache.get::<ValidationOutcome>(&cache_key).await {
            if let Some(cached) = lookup.data {
                return cached;
            }
        }

        let outcome = match self.backend.validate(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "content validator failed, failing open");
                ValidationOutcome::fail_open()
            }
        };

        let _ = self.cache.set(&cache_key, &outcome, self.cache_ttl_secs).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trawl_types::Result;

    struct CountingValidator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ValidatorPort for CountingValidator {
        async fn validate(&self, _request: ValidationRequest<'_>) -> Result<ValidationOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(trawl_types::error::TrawlError::Unknown("ai backend down".into()))
            } else {
                Ok(ValidationOutcome {
                    quality_score: 0.9,
                    sufficient: true,
                    reason: "good".to_string(),
                    needs_interaction: false,
                    suggested_actions: Vec::new(),
                })
            }
        }
    }

    #[tokio::test]
    async fn fails_open_when_backend_errors() {
        let backend = Arc::new(CountingValidator {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let validator = ContentValidator::new(backend, Arc::new(CacheManager::local_only()), Some(60));
        let outcome = validator
            .validate(ValidationRequest {
                html: "<p>x</p>",
                text: "x",
                markdown: "x",
                url: "https://example.com",
                task_description: None,
                page_title: None,
            })
            .await;
        assert!(outcome.sufficient);
        assert_eq!(outcome.quality_score, 0.5);
    }

    #[tokio::test]
    async fn caches_result_by_text_and_task_fingerprint() {
        let backend = Arc::new(CountingValidator {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let validator = ContentValidator::new(backend.clone(), Arc::new(CacheManager::local_only()), Some(60));

        let request = || ValidationRequest {
            html: "<p>some content</p>",
            text: "some content",
            markdown: "some content",
            url: "https://example.com",
            task_description: Some("extract prices"),
            page_title: None,
        };
        validator.validate(request()).await;
        validator.validate(request()).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
