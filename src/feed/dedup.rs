//! Stream deduplication by DOI or normalized title.

use std::collections::HashMap;

use crate::models::{CanonicalPaper, DedupKey};

/// Folds a stream of provider records into one paper per [`DedupKey`].
///
/// Records with the same key merge via [`CanonicalPaper::merge`]; because the
/// merge is commutative and associative, the pool's content is independent of
/// provider arrival order.
#[derive(Debug, Default)]
pub struct Deduplicator {
    pool: HashMap<DedupKey, CanonicalPaper>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one record, merging into an existing entry when the key matches
    pub fn push(&mut self, paper: CanonicalPaper) {
        let key = DedupKey::of(&paper);
        match self.pool.remove(&key) {
            Some(existing) => {
                self.pool.insert(key, existing.merge(paper));
            }
            None => {
                self.pool.insert(key, paper);
            }
        }
    }

    /// Number of distinct papers so far
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Iterate the merged papers
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalPaper> {
        self.pool.values()
    }

    /// Consume the deduplicator and return the pool keyed by identity
    pub fn into_pool(self) -> HashMap<DedupKey, CanonicalPaper> {
        self.pool
    }
}
