//! Summary generation with cache-aside and graceful degradation.

mod backend;

pub use backend::{BackendError, ChatBackend, SummaryBackend};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{summary_key, TieredCache, TtlClass};
use crate::config::SummarizerConfig;
use crate::models::{CanonicalPaper, Summary};
use crate::utils::RetryPolicy;

/// Produces a [`Summary`] for every paper, no matter what.
///
/// Generation goes through the derived cache with single-flight semantics.
/// Failures retry once with backoff and then degrade to placeholder
/// sections; a degraded summary is never cached, so the next request gets a
/// fresh attempt.
#[derive(Debug, Clone)]
pub struct SummaryGenerator {
    backend: Option<Arc<dyn SummaryBackend>>,
    cache: TieredCache,
    min_abstract_chars: usize,
    retry: RetryPolicy,
}

impl SummaryGenerator {
    /// Build from config; an unset `api_url` leaves the backend disabled and
    /// every summary degraded.
    pub fn from_config(config: &SummarizerConfig, cache: TieredCache) -> Self {
        let backend: Option<Arc<dyn SummaryBackend>> = config.api_url.as_ref().map(|url| {
            Arc::new(ChatBackend::new(
                url.clone(),
                config.api_key.clone(),
                config.model.clone(),
                Duration::from_secs(config.timeout_secs),
            )) as Arc<dyn SummaryBackend>
        });

        Self {
            backend,
            cache,
            min_abstract_chars: config.min_abstract_chars,
            retry: RetryPolicy {
                max_attempts: 2,
                initial_delay: Duration::from_millis(config.retry_delay_ms),
                backoff_multiplier: 2.0,
            },
        }
    }

    /// Build with an explicit backend (used by tests)
    pub fn with_backend(
        backend: Arc<dyn SummaryBackend>,
        cache: TieredCache,
        min_abstract_chars: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend: Some(backend),
            cache,
            min_abstract_chars,
            retry,
        }
    }

    /// Summarize a paper. Infallible: any failure path yields a degraded
    /// summary with all four placeholder sections.
    pub async fn summarize(&self, paper: &CanonicalPaper) -> Summary {
        if paper.r#abstract.trim().len() < self.min_abstract_chars {
            debug!(identity = %paper.identity(), "abstract too short, degrading without backend call");
            return Summary::degraded();
        }

        let Some(ref backend) = self.backend else {
            return Summary::degraded();
        };

        let key = summary_key(&paper.identity());
        let backend = Arc::clone(backend);
        let title = paper.title.clone();
        let abstract_text = paper.r#abstract.clone();
        let retry = self.retry;

        let result = self
            .cache
            .get_or_compute(TtlClass::Derived, key, || async move {
                let sections = retry
                    .run(|| backend.generate(&title, &abstract_text), |_| true)
                    .await?;
                let summary = Summary::complete(sections, backend.model());
                Ok(serde_json::to_value(summary)?)
            })
            .await;

        match result {
            Ok(value) => serde_json::from_value((*value).clone()).unwrap_or_else(|e| {
                warn!(error = %e, "cached summary failed to decode, degrading");
                Summary::degraded()
            }),
            Err(e) => {
                warn!(identity = %paper.identity(), error = %e, "summary generation failed, degrading");
                Summary::degraded()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::models::{ProviderId, SummarySections, SummaryStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct ScriptedBackend {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl SummaryBackend for ScriptedBackend {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            title: &str,
            _abstract_text: &str,
        ) -> Result<SummarySections, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(BackendError::Http("flaky".to_string()));
            }
            Ok(SummarySections {
                key_findings: vec![format!("Key finding of {title}")],
                methodology: "Scripted methodology.".to_string(),
                impact: "Scripted impact.".to_string(),
                conclusion: "Scripted conclusion.".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct FailingBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SummaryBackend for FailingBackend {
        fn model(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _title: &str,
            _abstract_text: &str,
        ) -> Result<SummarySections, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Http("always down".to_string()))
        }
    }

    fn paper(id: &str, abstract_text: &str) -> CanonicalPaper {
        CanonicalPaper::from_provider(ProviderId::Arxiv, id, format!("Paper {id}"), Utc::now())
            .with_abstract(abstract_text)
    }

    fn retry_fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
        }
    }

    fn generator(backend: Arc<dyn SummaryBackend>) -> SummaryGenerator {
        SummaryGenerator::with_backend(
            backend,
            TieredCache::new(&CacheConfig::default()),
            50,
            retry_fast(),
        )
    }

    const LONG_ABSTRACT: &str =
        "A sufficiently long abstract describing methods, results and conclusions in detail.";

    #[tokio::test]
    async fn test_complete_summary_from_backend() {
        let gen = generator(Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            fail_first: 0,
        }));

        let summary = gen.summarize(&paper("1", LONG_ABSTRACT)).await;
        assert_eq!(summary.status, SummaryStatus::Complete);
        assert_eq!(summary.model.as_deref(), Some("scripted"));
    }

    #[tokio::test]
    async fn test_short_abstract_degrades_without_backend_call() {
        let backend = Arc::new(FailingBackend {
            calls: AtomicU32::new(0),
        });
        let gen = generator(backend.clone());

        let summary = gen.summarize(&paper("1", "Too short.")).await;
        assert_eq!(summary.status, SummaryStatus::Degraded);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            fail_first: 1,
        });
        let gen = generator(backend.clone());

        let summary = gen.summarize(&paper("1", LONG_ABSTRACT)).await;
        assert_eq!(summary.status, SummaryStatus::Complete);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_degrade() {
        let backend = Arc::new(FailingBackend {
            calls: AtomicU32::new(0),
        });
        let gen = generator(backend.clone());

        let summary = gen.summarize(&paper("1", LONG_ABSTRACT)).await;
        assert_eq!(summary.status, SummaryStatus::Degraded);
        // One attempt plus one retry
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(!summary.sections.methodology.is_empty());
    }

    #[tokio::test]
    async fn test_summary_served_from_cache() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let gen = generator(backend.clone());
        let p = paper("cached", LONG_ABSTRACT);

        let first = gen.summarize(&p).await;
        let second = gen.summarize(&p).await;
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_degraded_summary_not_cached() {
        let cache = TieredCache::new(&CacheConfig::default());
        let failing = Arc::new(FailingBackend {
            calls: AtomicU32::new(0),
        });
        let gen = SummaryGenerator::with_backend(failing, cache.clone(), 50, retry_fast());
        let p = paper("retryable", LONG_ABSTRACT);

        assert_eq!(gen.summarize(&p).await.status, SummaryStatus::Degraded);

        // A healthy backend on the same cache can now fill the entry
        let healthy = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let gen = SummaryGenerator::with_backend(healthy, cache, 50, retry_fast());
        assert_eq!(gen.summarize(&p).await.status, SummaryStatus::Complete);
    }

    #[tokio::test]
    async fn test_no_backend_degrades() {
        let config = SummarizerConfig::default();
        let gen = SummaryGenerator::from_config(&config, TieredCache::new(&CacheConfig::default()));
        let summary = gen.summarize(&paper("1", LONG_ABSTRACT)).await;
        assert_eq!(summary.status, SummaryStatus::Degraded);
    }
}
