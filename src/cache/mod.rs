//! Tiered in-process cache with single-flight computes.
//!
//! Three TTL classes share one interface; payloads are opaque JSON values so
//! every component stores through the same cache. `get_or_compute` guarantees
//! at most one concurrent compute per key: concurrent callers for the same
//! key await the first caller's result.

use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Which expiry class an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlClass {
    /// Provider result pages, short-lived
    Listing,
    /// Per-paper metadata
    Detail,
    /// Derived artifacts such as summaries, longest-lived
    Derived,
}

/// Errors surfaced from a failed compute
pub type ComputeError = Box<dyn std::error::Error + Send + Sync>;

/// Cache with one moka instance per TTL class
#[derive(Debug, Clone)]
pub struct TieredCache {
    listing: Cache<String, Arc<Value>>,
    detail: Cache<String, Arc<Value>>,
    derived: Cache<String, Arc<Value>>,
}

impl TieredCache {
    pub fn new(config: &CacheConfig) -> Self {
        let build = |ttl_secs: u64| {
            Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build()
        };
        Self {
            listing: build(config.listing_ttl_secs),
            detail: build(config.detail_ttl_secs),
            derived: build(config.derived_ttl_secs),
        }
    }

    fn class(&self, class: TtlClass) -> &Cache<String, Arc<Value>> {
        match class {
            TtlClass::Listing => &self.listing,
            TtlClass::Detail => &self.detail,
            TtlClass::Derived => &self.derived,
        }
    }

    /// Look up a key, missing entries and expired entries both return None
    pub async fn get(&self, class: TtlClass, key: &str) -> Option<Arc<Value>> {
        self.class(class).get(key).await
    }

    /// Store a value unconditionally
    pub async fn set(&self, class: TtlClass, key: impl Into<String>, value: Value) {
        self.class(class).insert(key.into(), Arc::new(value)).await;
    }

    /// Return the cached value or run `compute` to fill it.
    ///
    /// Concurrent calls for the same key run `compute` once; the rest await
    /// that result. A failed compute caches nothing, so the next caller
    /// retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        class: TtlClass,
        key: impl Into<String>,
        compute: F,
    ) -> Result<Arc<Value>, Arc<ComputeError>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, ComputeError>>,
    {
        self.class(class)
            .try_get_with(key.into(), async move { compute().await.map(Arc::new) })
            .await
    }
}

/// Digest key for a provider listing: provider, sub-query and limit
pub fn listing_key(provider: &str, query: &str, limit: usize) -> String {
    let digest = md5::compute(format!("{provider}|{query}|{limit}").as_bytes());
    format!("listing:{provider}:{digest:x}")
}

/// Key for a paper's derived summary
pub fn summary_key(paper_identity: &str) -> String {
    format!("summary:{paper_identity}")
}
