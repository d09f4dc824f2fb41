use anyhow::Result;
use clap::Parser;
use researchnow_feed::cache::TieredCache;
use researchnow_feed::config::load_config;
use researchnow_feed::feed::{Aggregator, FeedService, QueryPlanner};
use researchnow_feed::providers::ProviderRegistry;
use researchnow_feed::server;
use researchnow_feed::summarizer::SummaryGenerator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ResearchNow Feed - randomized, summarized scholarly paper feeds over HTTP
#[derive(Parser, Debug)]
#[command(name = "researchnow-feed")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve randomized, summarized scholarly paper feeds", long_about = None)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    let subscriber = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("researchnow_feed={}", env_filter)),
    ));
    if cli.log_json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let registry = Arc::new(ProviderRegistry::from_config(
        &config.providers,
        config.feed.min_citations,
    ));
    if registry.is_empty() {
        tracing::warn!("no providers enabled, every feed request will come back empty");
    } else {
        tracing::info!(providers = registry.len(), "provider registry ready");
    }

    let cache = TieredCache::new(&config.cache);
    let aggregator = Aggregator::new(
        Arc::clone(&registry),
        QueryPlanner::new(),
        cache.clone(),
        &config.feed,
    );
    let summarizer = SummaryGenerator::from_config(&config.summarizer, cache);
    if config.summarizer.api_url.is_none() {
        tracing::warn!("summarizer api_url not set, summaries will be degraded");
    }

    let feed = Arc::new(FeedService::new(aggregator, summarizer, &config.feed));

    server::serve(&config.server, feed).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_logging_flags() {
        let cli = Cli::try_parse_from(["researchnow-feed", "--log-json", "-v"]).unwrap();
        assert!(cli.log_json);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["researchnow-feed"]).unwrap();
        assert!(!cli.log_json);
    }
}
