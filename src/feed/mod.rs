//! Feed assembly: collect, sample, summarize.

mod aggregator;
mod dedup;
mod planner;
mod sampler;

pub use aggregator::Aggregator;
pub use dedup::Deduplicator;
pub use planner::{QueryPlan, QueryPlanner};
pub use sampler::{sample, SampleSession, SessionStore};

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::models::{CanonicalPaper, Summary};
use crate::summarizer::SummaryGenerator;

/// Errors from feed assembly
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Nothing survived collection and filtering (or the session has seen
    /// everything). The HTTP layer maps this to an empty 200 response.
    #[error("no papers matched the request")]
    EmptyPool,
}

/// One feed entry: a paper with its summary embedded
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub paper: CanonicalPaper,
    pub summary: Summary,
}

/// Assembles feed responses end to end.
///
/// One request: collect a candidate pool, draw a non-repeating sample for
/// the session, then summarize the drawn papers under the remaining
/// deadline. Summaries still in flight when the deadline hits ship as
/// `Pending` with placeholder sections; their computes keep running into the
/// derived cache.
pub struct FeedService {
    aggregator: Aggregator,
    summarizer: SummaryGenerator,
    sessions: SessionStore,
    deadline: Duration,
    summary_workers: usize,
}

impl FeedService {
    pub fn new(aggregator: Aggregator, summarizer: SummaryGenerator, config: &FeedConfig) -> Self {
        Self {
            aggregator,
            summarizer,
            sessions: SessionStore::new(Duration::from_secs(config.session_idle_secs)),
            deadline: Duration::from_millis(config.request_deadline_ms),
            summary_workers: config.summary_workers.max(1),
        }
    }

    /// Produce up to `count` random papers for the optional field filter.
    ///
    /// A session ID makes draws non-repeating across requests; without one
    /// each request gets a throwaway session.
    pub async fn random_feed(
        &self,
        count: usize,
        field: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let deadline = Instant::now() + self.deadline;

        let pool = self.aggregator.collect(field, count, deadline).await;
        if pool.is_empty() {
            warn!(field = field.unwrap_or("any"), "candidate pool is empty");
            return Err(FeedError::EmptyPool);
        }

        let drawn = match session_id {
            Some(id) => self.sessions.with_session(id, |s| sample(&pool, count, s)),
            None => {
                let mut session = SampleSession::new();
                sample(&pool, count, &mut session)
            }
        };
        if drawn.is_empty() {
            return Err(FeedError::EmptyPool);
        }

        info!(
            pool = pool.len(),
            drawn = drawn.len(),
            field = field.unwrap_or("any"),
            "assembling feed"
        );

        Ok(self.summarize_all(drawn, deadline).await)
    }

    async fn summarize_all(&self, papers: Vec<CanonicalPaper>, deadline: Instant) -> Vec<FeedItem> {
        let semaphore = Arc::new(Semaphore::new(self.summary_workers));
        let (tx, mut rx) = mpsc::channel::<(usize, Summary)>(papers.len().max(1));

        for (idx, paper) in papers.iter().cloned().enumerate() {
            let tx = tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let summarizer = self.summarizer.clone();
            // Detached: a summary that misses the deadline still finishes
            // into the derived cache for the next request.
            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let summary = summarizer.summarize(&paper).await;
                let _ = tx.send((idx, summary)).await;
            });
        }
        drop(tx);

        let mut summaries: Vec<Option<Summary>> = vec![None; papers.len()];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some((idx, summary))) => summaries[idx] = Some(summary),
                Ok(None) => break,
                Err(_) => {
                    warn!("deadline reached with summaries still pending");
                    break;
                }
            }
        }

        papers
            .into_iter()
            .zip(summaries)
            .map(|(paper, summary)| FeedItem {
                paper,
                summary: summary.unwrap_or_else(Summary::pending),
            })
            .collect()
    }
}
