//! Utility modules shared across the service.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and user agent
//! - [`RetryPolicy`]: exponential-backoff retries with a retryable predicate

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::RetryPolicy;
