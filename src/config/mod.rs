//! Configuration management.
//!
//! Layered file + environment configuration with serde defaults. Environment
//! variables use the `RESEARCHNOW_FEED` prefix with `__` separating sections,
//! e.g. `RESEARCHNOW_FEED__FEED__MIN_CITATIONS=100`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Provider adapter settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Feed assembly settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Cache TTLs and capacity
    #[serde(default)]
    pub cache: CacheConfig,

    /// Summarization backend settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Settings for one provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider participates in fan-out
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sustained request budget
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// API key where the provider accepts one
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    fn with_rate(requests_per_second: u32) -> Self {
        Self {
            enabled: true,
            requests_per_second,
            api_key: None,
        }
    }
}

/// Provider adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_arxiv")]
    pub arxiv: ProviderConfig,

    #[serde(default = "default_crossref")]
    pub crossref: ProviderConfig,

    #[serde(default = "default_openalex")]
    pub openalex: ProviderConfig,

    #[serde(default = "default_semantic")]
    pub semantic: ProviderConfig,

    /// Contact email for the OpenAlex polite pool
    #[serde(default)]
    pub contact_email: Option<String>,

    /// How long a fetch may wait for a rate-limit permit before failing fast
    #[serde(default = "default_rate_wait_ms")]
    pub rate_wait_ms: u64,

    /// Per-request timeout for provider HTTP calls
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            arxiv: default_arxiv(),
            crossref: default_crossref(),
            openalex: default_openalex(),
            semantic: default_semantic(),
            contact_email: None,
            rate_wait_ms: default_rate_wait_ms(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_arxiv() -> ProviderConfig {
    ProviderConfig::with_rate(3)
}

fn default_crossref() -> ProviderConfig {
    ProviderConfig::with_rate(50)
}

fn default_openalex() -> ProviderConfig {
    ProviderConfig::with_rate(10)
}

fn default_semantic() -> ProviderConfig {
    ProviderConfig::with_rate(100)
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_rate_wait_ms() -> u64 {
    500
}

fn default_provider_timeout_secs() -> u64 {
    15
}

/// Feed assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Minimum citation count for the candidate pool
    #[serde(default = "default_min_citations")]
    pub min_citations: u32,

    /// Candidate pool target as a multiple of the requested count
    #[serde(default = "default_overfetch_multiplier")]
    pub overfetch_multiplier: usize,

    /// Concurrent provider fetches
    #[serde(default = "default_worker_budget")]
    pub worker_budget: usize,

    /// Concurrent summary generations per request
    #[serde(default = "default_summary_workers")]
    pub summary_workers: usize,

    /// Overall deadline for one feed request
    #[serde(default = "default_deadline_ms")]
    pub request_deadline_ms: u64,

    /// Results requested from each provider per sub-query
    #[serde(default = "default_per_provider_limit")]
    pub per_provider_limit: usize,

    /// Idle time after which a sampling session is dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            min_citations: default_min_citations(),
            overfetch_multiplier: default_overfetch_multiplier(),
            worker_budget: default_worker_budget(),
            summary_workers: default_summary_workers(),
            request_deadline_ms: default_deadline_ms(),
            per_provider_limit: default_per_provider_limit(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_min_citations() -> u32 {
    50
}

fn default_overfetch_multiplier() -> usize {
    2
}

fn default_worker_budget() -> usize {
    8
}

fn default_summary_workers() -> usize {
    4
}

fn default_deadline_ms() -> u64 {
    20_000
}

fn default_per_provider_limit() -> usize {
    50
}

fn default_session_idle_secs() -> u64 {
    1800
}

/// Cache configuration: one TTL per class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Listing-class entries (provider result pages)
    #[serde(default = "default_listing_ttl")]
    pub listing_ttl_secs: u64,

    /// Detail-class entries (per-paper metadata)
    #[serde(default = "default_detail_ttl")]
    pub detail_ttl_secs: u64,

    /// Derived-class entries (summaries)
    #[serde(default = "default_derived_ttl")]
    pub derived_ttl_secs: u64,

    /// Entry cap per class
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: default_listing_ttl(),
            detail_ttl_secs: default_detail_ttl(),
            derived_ttl_secs: default_derived_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

fn default_listing_ttl() -> u64 {
    300
}

fn default_detail_ttl() -> u64 {
    3600
}

fn default_derived_ttl() -> u64 {
    7200
}

fn default_cache_capacity() -> u64 {
    10_000
}

/// Summarization backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat-completions endpoint; unset disables the backend entirely
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Abstracts shorter than this skip generation and degrade immediately
    #[serde(default = "default_min_abstract_chars")]
    pub min_abstract_chars: usize,

    /// Per-call timeout
    #[serde(default = "default_summary_timeout_secs")]
    pub timeout_secs: u64,

    /// Backoff before the single retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: default_model(),
            min_abstract_chars: default_min_abstract_chars(),
            timeout_secs: default_summary_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_min_abstract_chars() -> usize {
    50
}

fn default_summary_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix("RESEARCHNOW_FEED")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
