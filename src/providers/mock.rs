//! Mock provider for testing purposes.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::models::{CanonicalPaper, ProviderId};
use crate::providers::{FetchError, ProviderAdapter};

/// A scripted provider that returns predefined papers or failures.
#[derive(Debug)]
pub struct MockProvider {
    id: ProviderId,
    script: Mutex<MockScript>,
}

#[derive(Debug)]
enum MockScript {
    Papers(Vec<CanonicalPaper>),
    Fail(fn() -> FetchError),
}

impl MockProvider {
    /// Provider that returns the same papers for every query
    pub fn returning(id: ProviderId, papers: Vec<CanonicalPaper>) -> Self {
        Self {
            id,
            script: Mutex::new(MockScript::Papers(papers)),
        }
    }

    /// Provider that always fails with the given error
    pub fn failing(id: ProviderId, error: fn() -> FetchError) -> Self {
        Self {
            id,
            script: Mutex::new(MockScript::Fail(error)),
        }
    }

    /// Replace the scripted papers
    pub fn set_papers(&self, papers: Vec<CanonicalPaper>) {
        let mut guard = self.script.lock().unwrap();
        *guard = MockScript::Papers(papers);
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn fetch(&self, _query: &str, limit: usize) -> Result<Vec<CanonicalPaper>, FetchError> {
        let guard = self.script.lock().unwrap();
        match &*guard {
            MockScript::Papers(papers) => Ok(papers.iter().take(limit).cloned().collect()),
            MockScript::Fail(make) => Err(make()),
        }
    }
}

/// Helper to build a displayable paper for tests
pub fn make_paper(id: &str, title: &str, citations: u32) -> CanonicalPaper {
    CanonicalPaper::from_provider(ProviderId::Other("mock".to_string()), id, title, Utc::now())
        .with_abstract(format!("Abstract of {title}, long enough to summarize properly."))
        .with_citations(citations)
        .with_fields(vec!["Computer Science".to_string()])
}
