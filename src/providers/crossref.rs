//! CrossRef provider implementation.
//!
//! Uses the CrossRef REST API (`/works`). Abstracts come wrapped in JATS XML
//! tags which are stripped before storage. Citation counts map from
//! `is-referenced-by-count`.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CanonicalPaper, ProviderId};
use crate::providers::{status_error, FetchError, ProviderAdapter, RateBudget};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef provider
#[derive(Debug)]
pub struct CrossRefProvider {
    client: HttpClient,
    budget: Arc<RateBudget>,
    base_url: String,
}

impl CrossRefProvider {
    pub fn new(client: HttpClient, budget: Arc<RateBudget>) -> Self {
        Self {
            client,
            budget,
            base_url: CROSSREF_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}/works?query={}&rows={}&sort=is-referenced-by-count&order=desc",
            self.base_url,
            urlencoding::encode(query),
            limit.min(1000),
        )
    }

    fn parse_item(item: CrItem) -> Option<CanonicalPaper> {
        let title = item.title.into_iter().next()?;
        if title.trim().is_empty() {
            return None;
        }

        let authors: Vec<String> = item
            .author
            .into_iter()
            .map(|a| match (a.given, a.family) {
                (Some(g), Some(f)) => format!("{g} {f}"),
                (None, Some(f)) => f,
                (Some(g), None) => g,
                (None, None) => String::new(),
            })
            .filter(|s| !s.is_empty())
            .collect();

        let year = item
            .issued
            .and_then(|d| d.date_parts.into_iter().next())
            .and_then(|parts| parts.into_iter().next());

        let mut paper = CanonicalPaper::from_provider(
            ProviderId::CrossRef,
            item.doi.clone(),
            title,
            Utc::now(),
        )
        .with_doi(item.doi)
        .with_authors(authors)
        .with_fields(item.subject)
        .with_citations(item.is_referenced_by_count.unwrap_or(0));

        if let Some(text) = item.r#abstract {
            paper = paper.with_abstract(strip_jats(&text));
        }
        if let Some(year) = year {
            paper = paper.with_year(year);
        }
        if let Some(venue) = item.container_title.into_iter().next() {
            paper = paper.with_venue(venue);
        }
        if let Some(link) = item
            .link
            .into_iter()
            .find(|l| l.content_type.as_deref() == Some("application/pdf"))
        {
            paper = paper.with_pdf_url(link.url);
        }

        Some(paper)
    }
}

/// Remove JATS XML tags and collapse whitespace in a CrossRef abstract
fn strip_jats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl ProviderAdapter for CrossRefProvider {
    fn id(&self) -> ProviderId {
        ProviderId::CrossRef
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError> {
        self.budget.acquire().await?;

        let response = self
            .client
            .client()
            .get(self.search_url(query, limit))
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("CrossRef request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(status_error("CrossRef", response.status()));
        }

        let data: CrResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(format!("CrossRef JSON: {e}")))?;

        Ok(data
            .message
            .items
            .into_iter()
            .filter_map(Self::parse_item)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct CrResponse {
    message: CrMessage,
}

#[derive(Debug, Deserialize)]
struct CrMessage {
    #[serde(default)]
    items: Vec<CrItem>,
}

#[derive(Debug, Deserialize)]
struct CrItem {
    #[serde(rename = "DOI")]
    doi: String,
    #[serde(default)]
    title: Vec<String>,
    r#abstract: Option<String>,
    #[serde(default)]
    author: Vec<CrAuthor>,
    issued: Option<CrDate>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "is-referenced-by-count")]
    is_referenced_by_count: Option<u32>,
    #[serde(default)]
    subject: Vec<String>,
    #[serde(default)]
    link: Vec<CrLink>,
}

#[derive(Debug, Deserialize)]
struct CrAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
struct CrLink {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}
