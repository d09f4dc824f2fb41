//! Canonical paper model shared by all provider adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The external provider a record was fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Arxiv,
    CrossRef,
    OpenAlex,
    SemanticScholar,
    #[serde(untagged)]
    Other(String),
}

impl ProviderId {
    /// Returns the display name of the provider
    pub fn name(&self) -> &str {
        match self {
            ProviderId::Arxiv => "arXiv",
            ProviderId::CrossRef => "CrossRef",
            ProviderId::OpenAlex => "OpenAlex",
            ProviderId::SemanticScholar => "Semantic Scholar",
            ProviderId::Other(s) => s,
        }
    }

    /// Returns the provider identifier used in config and cache keys
    pub fn id(&self) -> &str {
        match self {
            ProviderId::Arxiv => "arxiv",
            ProviderId::CrossRef => "crossref",
            ProviderId::OpenAlex => "openalex",
            ProviderId::SemanticScholar => "semantic",
            ProviderId::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where (and when) a merged record was fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Provider that contributed this record
    pub provider: ProviderId,

    /// Provider-native identifier (OpenAlex ID, arXiv ID, DOI, ...)
    pub provider_id: String,

    /// When the record was fetched
    pub fetched_at: DateTime<Utc>,
}

/// A research paper merged across providers
///
/// Identity is never empty: every record carries a non-empty title (adapters
/// drop title-less results) and at least one provenance entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalPaper {
    /// Digital Object Identifier, lowercased
    pub doi: Option<String>,

    /// Paper title
    pub title: String,

    /// Abstract text
    pub r#abstract: String,

    /// Authors in publication order
    pub authors: Vec<String>,

    /// Publication year
    pub publication_year: Option<i32>,

    /// Publication date (ISO format) when the provider reports one
    pub publication_date: Option<String>,

    /// Journal or venue name
    pub venue: Option<String>,

    /// Fields of study; never empty
    pub fields_of_study: Vec<String>,

    /// Citation count: the maximum reported by any contributing provider
    pub citation_count: u32,

    /// Whether the paper is open access
    pub is_open_access: bool,

    /// Direct PDF URL if any provider reported one
    pub pdf_url: Option<String>,

    /// Contributing providers, deterministically ordered
    pub provenance: Vec<Provenance>,
}

impl CanonicalPaper {
    /// Create a record from a single provider response
    pub fn from_provider(
        provider: ProviderId,
        provider_id: impl Into<String>,
        title: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            doi: None,
            title: title.into(),
            r#abstract: String::new(),
            authors: Vec::new(),
            publication_year: None,
            publication_date: None,
            venue: None,
            fields_of_study: vec!["General".to_string()],
            citation_count: 0,
            is_open_access: false,
            pdf_url: None,
            provenance: vec![Provenance {
                provider,
                provider_id: provider_id.into(),
                fetched_at,
            }],
        }
    }

    /// Set the DOI, lowercasing and stripping the resolver prefix
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        let doi = doi.into();
        let doi = doi
            .trim()
            .trim_start_matches("https://doi.org/")
            .trim_start_matches("http://doi.org/")
            .to_lowercase();
        if !doi.is_empty() {
            self.doi = Some(doi);
        }
        self
    }

    /// Set abstract text
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.r#abstract = text.into();
        self
    }

    /// Set author list
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Set publication year
    pub fn with_year(mut self, year: i32) -> Self {
        self.publication_year = Some(year);
        self
    }

    /// Set publication date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        let date = date.into();
        if !date.is_empty() {
            self.publication_date = Some(date);
        }
        self
    }

    /// Set the venue name
    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        let venue = venue.into();
        if !venue.is_empty() {
            self.venue = Some(venue);
        }
        self
    }

    /// Set field tags; empty input keeps the "General" default
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        let fields: Vec<String> = fields
            .into_iter()
            .filter(|f| !f.trim().is_empty())
            .collect();
        if !fields.is_empty() {
            self.fields_of_study = fields;
        }
        self
    }

    /// Set citation count
    pub fn with_citations(mut self, count: u32) -> Self {
        self.citation_count = count;
        self
    }

    /// Set open-access flag
    pub fn with_open_access(mut self, open: bool) -> Self {
        self.is_open_access = open;
        self
    }

    /// Set PDF URL
    pub fn with_pdf_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.pdf_url = Some(url);
        }
        self
    }

    /// Stable identifier used to key summaries: DOI if available, else the
    /// first provenance entry's provider-native ID.
    pub fn identity(&self) -> String {
        if let Some(ref doi) = self.doi {
            return format!("doi:{doi}");
        }
        self.provenance
            .first()
            .map(|p| format!("{}:{}", p.provider.id(), p.provider_id))
            .unwrap_or_else(|| format!("title:{}", normalize_title(&self.title)))
    }

    /// Whether the record carries the minimum metadata required for display
    pub fn has_display_metadata(&self) -> bool {
        !self.title.trim().is_empty() && !self.r#abstract.trim().is_empty()
    }

    /// Merge two records referring to the same paper.
    ///
    /// Commutative and associative: the result is the same whatever order
    /// records arrive in. Citation count takes the maximum, field tags the
    /// sorted union, provenance the union; scalar fields are chosen by a
    /// total order (longer first, then lexicographic) so ties break
    /// deterministically.
    pub fn merge(self, other: Self) -> Self {
        let doi = match (self.doi, other.doi) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let fields: BTreeSet<String> = self
            .fields_of_study
            .into_iter()
            .chain(other.fields_of_study)
            .collect();

        let mut provenance: Vec<Provenance> = self.provenance;
        for entry in other.provenance {
            match provenance
                .iter_mut()
                .find(|p| p.provider == entry.provider && p.provider_id == entry.provider_id)
            {
                Some(existing) => {
                    existing.fetched_at = existing.fetched_at.min(entry.fetched_at);
                }
                None => provenance.push(entry),
            }
        }
        provenance.sort_by(|a, b| {
            (a.provider.id(), a.provider_id.as_str())
                .cmp(&(b.provider.id(), b.provider_id.as_str()))
        });

        Self {
            doi,
            title: pick_text(self.title, other.title),
            r#abstract: pick_text(self.r#abstract, other.r#abstract),
            authors: pick_list(self.authors, other.authors),
            publication_year: merge_opt_max(self.publication_year, other.publication_year),
            publication_date: merge_opt_text(self.publication_date, other.publication_date),
            venue: merge_opt_text(self.venue, other.venue),
            fields_of_study: fields.into_iter().collect(),
            citation_count: self.citation_count.max(other.citation_count),
            is_open_access: self.is_open_access || other.is_open_access,
            pdf_url: merge_opt_text(self.pdf_url, other.pdf_url),
            provenance,
        }
    }
}

// Deterministic choice between two strings: longer wins, ties go to the
// lexicographically smaller value. Picking the maximum of a total order
// keeps merge associative.
fn pick_text(a: String, b: String) -> String {
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => a.min(b),
    }
}

fn pick_list(a: Vec<String>, b: Vec<String>) -> Vec<String> {
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a <= b {
                a
            } else {
                b
            }
        }
    }
}

fn merge_opt_text(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick_text(a, b)),
        (a, b) => a.or(b),
    }
}

fn merge_opt_max(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Normalized comparison key: DOI when present, else the normalized title
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derive the key for a paper
    pub fn of(paper: &CanonicalPaper) -> Self {
        match paper.doi {
            Some(ref doi) => Self(format!("doi:{doi}")),
            None => Self(format!("title:{}", normalize_title(&paper.title))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase a title and strip punctuation for comparison
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(provider: ProviderId, id: &str, title: &str) -> CanonicalPaper {
        CanonicalPaper::from_provider(provider, id, title, Utc::now())
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Hello, World!"), "hello world");
        assert_eq!(normalize_title("Test   Title"), "test title");
        assert_eq!(
            normalize_title("Attention Is All You Need."),
            "attention is all you need"
        );
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("   "), "");
    }

    #[test]
    fn test_dedup_key_prefers_doi() {
        let with_doi = paper(ProviderId::CrossRef, "x", "Some Title").with_doi("10.1/ABC");
        assert_eq!(DedupKey::of(&with_doi).as_str(), "doi:10.1/abc");

        let without = paper(ProviderId::Arxiv, "2301.1", "Some Title!");
        assert_eq!(DedupKey::of(&without).as_str(), "title:some title");
    }

    #[test]
    fn test_doi_resolver_prefix_stripped() {
        let p = paper(ProviderId::OpenAlex, "W1", "T").with_doi("https://doi.org/10.1/XYZ");
        assert_eq!(p.doi.as_deref(), Some("10.1/xyz"));
    }

    #[test]
    fn test_merge_takes_max_citations_and_unions_provenance() {
        let a = paper(ProviderId::CrossRef, "c1", "A Paper")
            .with_doi("10.1/p")
            .with_citations(50);
        let b = paper(ProviderId::OpenAlex, "W2", "A Paper (extended title)")
            .with_doi("10.1/p")
            .with_citations(120);

        let merged = a.merge(b);
        assert_eq!(merged.citation_count, 120);
        assert_eq!(merged.provenance.len(), 2);
        assert_eq!(merged.title, "A Paper (extended title)");
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = paper(ProviderId::CrossRef, "c1", "Title One")
            .with_doi("10.1/p")
            .with_citations(10)
            .with_fields(vec!["Physics".into()]);
        let b = paper(ProviderId::OpenAlex, "W2", "Title Two!")
            .with_doi("10.1/p")
            .with_citations(99)
            .with_fields(vec!["Mathematics".into()]);

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);
        assert_eq!(
            serde_json::to_value(&ab).unwrap(),
            serde_json::to_value(&ba).unwrap()
        );
        assert_eq!(
            ab.fields_of_study,
            vec!["Mathematics".to_string(), "Physics".to_string()]
        );
        assert_eq!(ab.citation_count, 99);
    }

    #[test]
    fn test_merge_is_associative() {
        let a = paper(ProviderId::Arxiv, "1", "Same Title").with_citations(5);
        let b = paper(ProviderId::CrossRef, "2", "Same Title").with_citations(7);
        let c = paper(ProviderId::SemanticScholar, "3", "Same Title").with_citations(3);

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        assert_eq!(
            serde_json::to_value(&left).unwrap(),
            serde_json::to_value(&right).unwrap()
        );
        assert_eq!(left.citation_count, 7);
        assert_eq!(left.provenance.len(), 3);
    }

    #[test]
    fn test_empty_fields_default_to_general() {
        let p = paper(ProviderId::OpenAlex, "W1", "T").with_fields(vec![]);
        assert_eq!(p.fields_of_study, vec!["General".to_string()]);
    }

    #[test]
    fn test_display_metadata() {
        let bare = paper(ProviderId::Arxiv, "1", "T");
        assert!(!bare.has_display_metadata());

        let full = paper(ProviderId::Arxiv, "1", "T").with_abstract("An abstract.");
        assert!(full.has_display_metadata());
    }
}
