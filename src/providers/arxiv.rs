//! arXiv provider implementation.
//!
//! Uses the arXiv Atom API via `feed-rs`. arXiv reports no citation counts;
//! the merge policy lets other providers fill those in. Category terms map to
//! human-readable fields of study.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use feed_rs::parser;
use std::sync::Arc;

use crate::models::{CanonicalPaper, ProviderId};
use crate::providers::{status_error, FetchError, ProviderAdapter, RateBudget};
use crate::utils::HttpClient;

const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";
const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";

/// arXiv provider
#[derive(Debug)]
pub struct ArxivProvider {
    client: HttpClient,
    budget: Arc<RateBudget>,
    base_url: String,
}

impl ArxivProvider {
    pub fn new(client: HttpClient, budget: Arc<RateBudget>) -> Self {
        Self {
            client,
            budget,
            base_url: ARXIV_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}?search_query=all:{}&max_results={}&sortBy=relevance&sortOrder=descending",
            self.base_url,
            urlencoding::encode(query),
            limit.min(200),
        )
    }

    fn parse_entry(entry: &feed_rs::model::Entry) -> Option<CanonicalPaper> {
        // Entry ID looks like http://arxiv.org/abs/2301.00001v2
        let arxiv_id = entry
            .id
            .rsplit("/abs/")
            .next()?
            .split('v')
            .next()?
            .to_string();

        let title = entry.title.as_ref().map(|t| t.content.trim())?;
        if title.is_empty() {
            return None;
        }

        let authors: Vec<String> = entry.authors.iter().map(|a| a.name.clone()).collect();

        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| s.content.trim().to_string())
            .unwrap_or_default();

        let fields: Vec<String> = entry
            .categories
            .iter()
            .map(|c| category_to_field(&c.term).to_string())
            .collect();

        let mut paper = CanonicalPaper::from_provider(
            ProviderId::Arxiv,
            arxiv_id.clone(),
            title,
            Utc::now(),
        )
        .with_abstract(abstract_text)
        .with_authors(authors)
        .with_fields(fields)
        .with_open_access(true)
        .with_pdf_url(format!("{ARXIV_PDF_URL}/{arxiv_id}.pdf"));

        if let Some(published) = entry.published {
            paper = paper
                .with_year(published.year())
                .with_date(published.to_rfc3339());
        }

        Some(paper)
    }
}

/// Map an arXiv category term like "cs.LG" to a field-of-study name
fn category_to_field(category: &str) -> &'static str {
    let lower = category.to_lowercase();
    if lower.starts_with("cs") {
        match lower.as_str() {
            "cs.ai" => "Artificial Intelligence",
            "cs.lg" | "cs.ml" => "Machine Learning",
            "cs.cv" => "Computer Vision",
            "cs.cl" => "Natural Language Processing",
            _ => "Computer Science",
        }
    } else if lower.starts_with("physics")
        || lower.starts_with("quant-ph")
        || lower.starts_with("astro-ph")
        || lower.starts_with("cond-mat")
    {
        "Physics"
    } else if lower.starts_with("math") {
        "Mathematics"
    } else if lower.starts_with("q-bio") {
        "Biology"
    } else if lower.starts_with("econ") || lower.starts_with("q-fin") {
        "Economics"
    } else if lower.starts_with("stat") {
        "Statistics"
    } else {
        "General Science"
    }
}

#[async_trait]
impl ProviderAdapter for ArxivProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Arxiv
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError> {
        self.budget.acquire().await?;

        let response = self
            .client
            .client()
            .get(self.search_url(query, limit))
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("arXiv request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("arXiv", response.status()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unavailable(format!("arXiv read failed: {e}")))?;

        let feed = parser::parse(bytes.as_ref())
            .map_err(|e| FetchError::MalformedResponse(format!("arXiv Atom: {e}")))?;

        Ok(feed.entries.iter().filter_map(Self::parse_entry).collect())
    }
}
