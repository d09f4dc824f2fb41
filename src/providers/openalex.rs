//! OpenAlex provider implementation.
//!
//! Uses the OpenAlex REST API (`/works`). Abstracts arrive as an inverted
//! index and are reconstructed locally. Supplying a contact email joins the
//! polite pool for better rate limits.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{CanonicalPaper, ProviderId};
use crate::providers::{status_error, FetchError, ProviderAdapter, RateBudget};
use crate::utils::HttpClient;

const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// OpenAlex provider
#[derive(Debug)]
pub struct OpenAlexProvider {
    client: HttpClient,
    budget: Arc<RateBudget>,
    base_url: String,
    email: Option<String>,
    min_citations: u32,
}

impl OpenAlexProvider {
    pub fn new(
        client: HttpClient,
        budget: Arc<RateBudget>,
        email: Option<String>,
        min_citations: u32,
    ) -> Self {
        Self {
            client,
            budget,
            base_url: OPENALEX_API_BASE.to_string(),
            email,
            min_citations,
        }
    }

    /// Override the API base URL (used by HTTP-stub tests)
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        let mut url = format!(
            "{}/works?search={}&per-page={}&filter=cited_by_count:>{}&sort=cited_by_count:desc",
            self.base_url,
            urlencoding::encode(query),
            limit.min(200),
            self.min_citations.saturating_sub(1),
        );
        if let Some(ref email) = self.email {
            url = format!("{}&mailto={}", url, urlencoding::encode(email));
        }
        url
    }

    fn parse_work(work: OAWork) -> Option<CanonicalPaper> {
        let title = work.title.or(work.display_name)?;
        if title.trim().is_empty() {
            return None;
        }
        let id = work.id.unwrap_or_default();
        let provider_id = id.rsplit('/').next().unwrap_or(&id).to_string();

        let authors: Vec<String> = work
            .authorships
            .into_iter()
            .filter_map(|a| a.author.and_then(|a| a.display_name))
            .collect();

        let fields: Vec<String> = work
            .concepts
            .into_iter()
            .filter(|c| c.level <= 1)
            .filter_map(|c| c.display_name)
            .take(3)
            .collect();

        let abstract_text = work
            .abstract_inverted_index
            .map(reconstruct_abstract)
            .unwrap_or_default();

        let mut paper = CanonicalPaper::from_provider(
            ProviderId::OpenAlex,
            provider_id,
            title,
            Utc::now(),
        )
        .with_abstract(abstract_text)
        .with_authors(authors)
        .with_fields(fields)
        .with_citations(work.cited_by_count.unwrap_or(0))
        .with_open_access(work.open_access.as_ref().is_some_and(|oa| oa.is_oa));

        if let Some(doi) = work.doi {
            paper = paper.with_doi(doi);
        }
        if let Some(year) = work.publication_year {
            paper = paper.with_year(year);
        }
        if let Some(date) = work.publication_date {
            paper = paper.with_date(date);
        }
        if let Some(venue) = work
            .primary_location
            .and_then(|l| l.source)
            .and_then(|s| s.display_name)
        {
            paper = paper.with_venue(venue);
        }
        if let Some(url) = work.best_oa_location.and_then(|l| l.pdf_url) {
            paper = paper.with_pdf_url(url);
        }

        Some(paper)
    }
}

/// Rebuild abstract text from OpenAlex's inverted index representation
fn reconstruct_abstract(index: HashMap<String, Vec<u32>>) -> String {
    let mut positions: Vec<(u32, &str)> = index
        .iter()
        .flat_map(|(word, at)| at.iter().map(move |&p| (p, word.as_str())))
        .collect();
    positions.sort_unstable_by_key(|&(p, _)| p);
    positions
        .into_iter()
        .map(|(_, w)| w)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl ProviderAdapter for OpenAlexProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAlex
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError> {
        self.budget.acquire().await?;

        let response = self
            .client
            .client()
            .get(self.search_url(query, limit))
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("OpenAlex request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("OpenAlex", response.status()));
        }

        let data: WorksResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(format!("OpenAlex JSON: {e}")))?;

        Ok(data
            .results
            .into_iter()
            .filter_map(Self::parse_work)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<OAWork>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    id: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    doi: Option<String>,
    publication_year: Option<i32>,
    publication_date: Option<String>,
    cited_by_count: Option<u32>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
    #[serde(default)]
    concepts: Vec<OAConcept>,
    abstract_inverted_index: Option<HashMap<String, Vec<u32>>>,
    open_access: Option<OAOpenAccess>,
    primary_location: Option<OALocation>,
    best_oa_location: Option<OALocation>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    author: Option<OAAuthor>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAConcept {
    display_name: Option<String>,
    #[serde(default)]
    level: u32,
}

#[derive(Debug, Deserialize)]
struct OAOpenAccess {
    #[serde(default)]
    is_oa: bool,
}

#[derive(Debug, Deserialize)]
struct OALocation {
    pdf_url: Option<String>,
    source: Option<OASource>,
}

#[derive(Debug, Deserialize)]
struct OASource {
    display_name: Option<String>,
}
