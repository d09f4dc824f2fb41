//! Semantic Scholar provider implementation.
//!
//! Uses the Academic Graph API (`/graph/v1/paper/search`) with an explicit
//! field list. An API key raises the rate limit but is optional.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CanonicalPaper, ProviderId};
use crate::providers::{status_error, FetchError, ProviderAdapter, RateBudget};
use crate::utils::HttpClient;

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org";

const SEARCH_FIELDS: &str = "title,abstract,authors,year,publicationDate,venue,\
                             citationCount,fieldsOfStudy,externalIds,isOpenAccess,openAccessPdf";

/// Semantic Scholar provider
#[derive(Debug)]
pub struct SemanticScholarProvider {
    client: HttpClient,
    budget: Arc<RateBudget>,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarProvider {
    pub fn new(client: HttpClient, budget: Arc<RateBudget>, api_key: Option<String>) -> Self {
        Self {
            client,
            budget,
            base_url: SEMANTIC_API_BASE.to_string(),
            api_key,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}/graph/v1/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(query),
            limit.min(100),
            SEARCH_FIELDS,
        )
    }

    fn parse_paper(item: S2Paper) -> Option<CanonicalPaper> {
        let title = item.title?;
        if title.trim().is_empty() {
            return None;
        }

        let authors: Vec<String> = item
            .authors
            .into_iter()
            .filter_map(|a| a.name)
            .collect();

        let mut paper = CanonicalPaper::from_provider(
            ProviderId::SemanticScholar,
            item.paper_id.unwrap_or_default(),
            title,
            Utc::now(),
        )
        .with_abstract(item.r#abstract.unwrap_or_default())
        .with_authors(authors)
        .with_fields(item.fields_of_study.unwrap_or_default())
        .with_citations(item.citation_count.unwrap_or(0))
        .with_open_access(item.is_open_access.unwrap_or(false));

        if let Some(doi) = item.external_ids.and_then(|ids| ids.doi) {
            paper = paper.with_doi(doi);
        }
        if let Some(year) = item.year {
            paper = paper.with_year(year);
        }
        if let Some(date) = item.publication_date {
            paper = paper.with_date(date);
        }
        if let Some(venue) = item.venue {
            paper = paper.with_venue(venue);
        }
        if let Some(url) = item.open_access_pdf.and_then(|p| p.url) {
            paper = paper.with_pdf_url(url);
        }

        Some(paper)
    }
}

#[async_trait]
impl ProviderAdapter for SemanticScholarProvider {
    fn id(&self) -> ProviderId {
        ProviderId::SemanticScholar
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError> {
        self.budget.acquire().await?;

        let mut request = self.client.client().get(self.search_url(query, limit));
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("Semantic Scholar request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("Semantic Scholar", response.status()));
        }

        let data: S2Response = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(format!("Semantic Scholar JSON: {e}")))?;

        Ok(data.data.into_iter().filter_map(Self::parse_paper).collect())
    }
}

#[derive(Debug, Deserialize)]
struct S2Response {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    r#abstract: Option<String>,
    year: Option<i32>,
    publication_date: Option<String>,
    venue: Option<String>,
    citation_count: Option<u32>,
    fields_of_study: Option<Vec<String>>,
    external_ids: Option<S2ExternalIds>,
    is_open_access: Option<bool>,
    open_access_pdf: Option<S2Pdf>,
    #[serde(default)]
    authors: Vec<S2Author>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Pdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}
