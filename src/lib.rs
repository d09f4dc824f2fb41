//! # ResearchNow Feed
//!
//! An HTTP service that aggregates scholarly paper metadata from multiple
//! rate-limited providers and serves randomized, summarized feeds.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures ([`CanonicalPaper`], [`models::Summary`])
//! - [`providers`]: Provider adapters with per-provider rate budgets
//! - [`feed`]: Query planning, fan-out collection, dedup, and sampling
//! - [`summarizer`]: AI summary generation with cache-aside degradation
//! - [`cache`]: Tiered in-memory cache with single-flight computes
//! - [`server`]: The axum HTTP surface
//! - [`config`]: Configuration management
//! - [`utils`]: HTTP client and retry helpers

pub mod cache;
pub mod config;
pub mod feed;
pub mod models;
pub mod providers;
pub mod server;
pub mod summarizer;
pub mod utils;

// Re-export commonly used types
pub use feed::FeedService;
pub use models::CanonicalPaper;
pub use providers::{ProviderAdapter, ProviderRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
