//! Core data models for papers and summaries.

mod paper;
mod summary;

pub use paper::{normalize_title, CanonicalPaper, DedupKey, ProviderId, Provenance};
pub use summary::{Summary, SummarySections, SummaryStatus};
