//! Fan-out collection of candidate papers across providers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::{listing_key, TieredCache, TtlClass};
use crate::config::FeedConfig;
use crate::feed::{Deduplicator, QueryPlanner};
use crate::models::{CanonicalPaper, DedupKey};
use crate::providers::{ProviderAdapter, ProviderRegistry};

/// Collects a deduplicated, filtered candidate pool for one request.
///
/// (provider, sub-query) jobs are issued lazily in a window of
/// `worker_budget` concurrent fetches: a new job is dispatched only when one
/// finishes and the over-fetch target is still unmet, so sub-queries queued
/// behind an early stop never hit the network. Dispatched fetches run
/// detached and write through the listing cache, so one that outlives the
/// request deadline still lands its results for the next request. Provider
/// failures are absorbed: they cost coverage, not the request.
pub struct Aggregator {
    registry: Arc<ProviderRegistry>,
    planner: QueryPlanner,
    cache: TieredCache,
    min_citations: u32,
    overfetch_multiplier: usize,
    worker_budget: usize,
    per_provider_limit: usize,
}

impl Aggregator {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        planner: QueryPlanner,
        cache: TieredCache,
        config: &FeedConfig,
    ) -> Self {
        Self {
            registry,
            planner,
            cache,
            min_citations: config.min_citations,
            overfetch_multiplier: config.overfetch_multiplier.max(1),
            worker_budget: config.worker_budget.max(1),
            per_provider_limit: config.per_provider_limit.max(1),
        }
    }

    fn passes_filter(&self, paper: &CanonicalPaper) -> bool {
        paper.citation_count >= self.min_citations && paper.has_display_metadata()
    }

    /// Spawn one fetch as a detached task. Always sends exactly one message,
    /// an empty batch on failure, so the receive loop can count completions.
    fn spawn_fetch(
        &self,
        provider: Arc<dyn ProviderAdapter>,
        query: String,
        tx: mpsc::Sender<Vec<CanonicalPaper>>,
    ) {
        let cache = self.cache.clone();
        let limit = self.per_provider_limit;

        // Detached on purpose: the task outlives an abandoned request and
        // its result still fills the listing cache.
        tokio::spawn(async move {
            let provider_name = provider.id().id().to_string();
            let key = listing_key(&provider_name, &query, limit);

            let result = cache
                .get_or_compute(TtlClass::Listing, key, || {
                    let provider = Arc::clone(&provider);
                    let query = query.clone();
                    async move {
                        let papers = provider.fetch(&query, limit).await?;
                        Ok(serde_json::to_value(papers)?)
                    }
                })
                .await;

            let papers = match result {
                Ok(value) => {
                    match serde_json::from_value::<Vec<CanonicalPaper>>((*value).clone()) {
                        Ok(papers) => papers,
                        Err(e) => {
                            warn!(provider = %provider_name, error = %e, "cached listing failed to decode");
                            Vec::new()
                        }
                    }
                }
                Err(e) => {
                    warn!(provider = %provider_name, query = %query, error = %e, "provider fetch failed, skipping");
                    Vec::new()
                }
            };
            let _ = tx.send(papers).await;
        });
    }

    /// Collect candidates for `field` until the over-fetch target is met or
    /// the deadline arrives. Returns the filtered pool, possibly empty.
    pub async fn collect(
        &self,
        field: Option<&str>,
        count: usize,
        deadline: Instant,
    ) -> HashMap<DedupKey, CanonicalPaper> {
        let plan = self.planner.plan(field);
        let target = count.saturating_mul(self.overfetch_multiplier).max(count);

        let mut queue: VecDeque<(Arc<dyn ProviderAdapter>, String)> = VecDeque::new();
        for provider in self.registry.all() {
            for query in &plan.sub_queries {
                queue.push_back((Arc::clone(provider), query.clone()));
            }
        }

        let (tx, mut rx) = mpsc::channel::<Vec<CanonicalPaper>>(queue.len().max(1));
        let mut in_flight = 0usize;
        for _ in 0..self.worker_budget {
            let Some((provider, query)) = queue.pop_front() else {
                break;
            };
            self.spawn_fetch(provider, query, tx.clone());
            in_flight += 1;
        }
        debug!(
            dispatched = in_flight,
            queued = queue.len(),
            target,
            "candidate collection started"
        );

        let mut dedup = Deduplicator::new();
        while in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    collected = dedup.len(),
                    "deadline reached while collecting candidates"
                );
                break;
            }

            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(papers)) => {
                    in_flight -= 1;
                    for paper in papers {
                        dedup.push(paper);
                    }
                    let eligible = dedup.iter().filter(|p| self.passes_filter(p)).count();
                    if eligible >= target {
                        debug!(
                            eligible,
                            target,
                            skipped = queue.len(),
                            "over-fetch target met, stopping early"
                        );
                        break;
                    }
                    if let Some((provider, query)) = queue.pop_front() {
                        self.spawn_fetch(provider, query, tx.clone());
                        in_flight += 1;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        collected = dedup.len(),
                        "deadline reached while collecting candidates"
                    );
                    break;
                }
            }
        }

        dedup
            .into_pool()
            .into_iter()
            .filter(|(_, paper)| self.passes_filter(paper))
            .collect()
    }
}
