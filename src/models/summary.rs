//! AI-generated paper summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a summary was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    /// Generation is still in flight; the feed deadline elapsed first
    Pending,
    /// Produced by the summarization backend
    Complete,
    /// Backend unavailable or content insufficient; placeholder sections
    Degraded,
}

/// The four summary sections shown in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySections {
    pub key_findings: Vec<String>,
    pub methodology: String,
    pub impact: String,
    pub conclusion: String,
}

impl SummarySections {
    /// Placeholder sections served when generation fails or is skipped
    pub fn placeholder() -> Self {
        Self {
            key_findings: vec![
                "Novel research findings presented in this paper".to_string(),
                "Builds upon existing work in the field".to_string(),
                "Provides theoretical and practical contributions".to_string(),
            ],
            methodology: "The research employs rigorous scientific methodology combining \
                          theoretical analysis with empirical validation."
                .to_string(),
            impact: "This work advances the state of the art and has potential applications \
                     in multiple domains."
                .to_string(),
            conclusion: "This research presents important contributions and opens avenues \
                         for future investigation in the field."
                .to_string(),
        }
    }
}

/// A structured summary of a paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub sections: SummarySections,
    pub status: SummaryStatus,

    /// Model that produced the sections, absent for degraded summaries
    pub model: Option<String>,

    pub generated_at: DateTime<Utc>,
}

impl Summary {
    pub fn complete(sections: SummarySections, model: impl Into<String>) -> Self {
        Self {
            sections,
            status: SummaryStatus::Complete,
            model: Some(model.into()),
            generated_at: Utc::now(),
        }
    }

    pub fn degraded() -> Self {
        Self {
            sections: SummarySections::placeholder(),
            status: SummaryStatus::Degraded,
            model: None,
            generated_at: Utc::now(),
        }
    }

    pub fn pending() -> Self {
        Self {
            sections: SummarySections::placeholder(),
            status: SummaryStatus::Pending,
            model: None,
            generated_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == SummaryStatus::Complete
    }
}
