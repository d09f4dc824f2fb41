//! Provider adapters with a trait-based plugin architecture.
//!
//! Each external catalog implements [`ProviderAdapter`], translating its wire
//! format into [`CanonicalPaper`] records. Adapters never panic on malformed
//! input and go through a per-provider [`RateBudget`] before touching the
//! network. Providers can be enabled or disabled at runtime through config.

mod arxiv;
mod crossref;
mod limiter;
pub mod mock;
mod openalex;
mod registry;
mod semantic;

pub use arxiv::ArxivProvider;
pub use crossref::CrossRefProvider;
pub use limiter::RateBudget;
pub use mock::MockProvider;
pub use openalex::OpenAlexProvider;
pub use registry::ProviderRegistry;
pub use semantic::SemanticScholarProvider;

use crate::models::{CanonicalPaper, ProviderId};
use async_trait::async_trait;

/// The ProviderAdapter trait defines the interface for all catalog providers.
///
/// Implementations fetch up to `limit` papers for a free-text query and map
/// them into the canonical model. Records without a title are dropped during
/// parsing rather than surfaced as errors.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Provider identity
    fn id(&self) -> ProviderId;

    /// Human-readable name
    fn name(&self) -> &str {
        "provider"
    }

    /// Fetch papers matching the query
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError>;
}

/// Errors that can occur when fetching from a provider
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Local rate budget exhausted or the provider returned 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Network failure, timeout, or provider-side error response
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a payload that could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited | FetchError::Unavailable(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            FetchError::RateLimited
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedResponse(format!("JSON: {err}"))
    }
}

/// Map a non-success HTTP status to the error taxonomy
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode) -> FetchError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        FetchError::RateLimited
    } else {
        FetchError::Unavailable(format!("{provider} returned status {status}"))
    }
}
