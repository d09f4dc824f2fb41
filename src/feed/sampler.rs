//! Session-scoped random sampling without repeats.

use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::{CanonicalPaper, DedupKey};

/// Keys a caller has already been shown
#[derive(Debug, Default)]
pub struct SampleSession {
    seen: HashSet<DedupKey>,
    last_active: Option<Instant>,
}

impl SampleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Draw up to `count` papers uniformly at random from the pool, skipping
/// anything the session has already seen. Drawn keys are recorded in the
/// session. Returns fewer than `count` when the unseen pool is smaller.
pub fn sample(
    pool: &HashMap<DedupKey, CanonicalPaper>,
    count: usize,
    session: &mut SampleSession,
) -> Vec<CanonicalPaper> {
    let mut candidates: Vec<&DedupKey> = pool
        .keys()
        .filter(|key| !session.has_seen(key))
        .collect();

    let mut rng = rand::thread_rng();
    candidates.shuffle(&mut rng);
    candidates.truncate(count);

    session.last_active = Some(Instant::now());
    candidates
        .into_iter()
        .map(|key| {
            session.seen.insert(key.clone());
            pool[key].clone()
        })
        .collect()
}

/// In-memory store of named sampling sessions.
///
/// Sessions are pruned after an idle timeout; nothing persists across
/// restarts. Callers without a session ID get a throwaway session instead.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SampleSession>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Run `f` with the named session, creating it on first use.
    ///
    /// Prunes idle sessions opportunistically on each access.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut SampleSession) -> R) -> R {
        let mut sessions = self.sessions.lock().unwrap();

        let timeout = self.idle_timeout;
        sessions.retain(|_, s| {
            s.last_active
                .map(|t| t.elapsed() < timeout)
                .unwrap_or(true)
        });

        let session = sessions.entry(id.to_string()).or_default();
        f(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderId;
    use chrono::Utc;

    fn pool(n: usize) -> HashMap<DedupKey, CanonicalPaper> {
        let mut pool = HashMap::new();
        for i in 0..n {
            let paper = CanonicalPaper::from_provider(
                ProviderId::Arxiv,
                format!("{i}"),
                format!("Paper number {i}"),
                Utc::now(),
            );
            pool.insert(DedupKey::of(&paper), paper);
        }
        pool
    }

    #[test]
    fn test_sample_draws_requested_count() {
        let pool = pool(20);
        let mut session = SampleSession::new();
        let drawn = sample(&pool, 5, &mut session);
        assert_eq!(drawn.len(), 5);
        assert_eq!(session.seen_count(), 5);
    }

    #[test]
    fn test_no_repeats_across_draws() {
        let pool = pool(10);
        let mut session = SampleSession::new();

        let mut titles = HashSet::new();
        for _ in 0..5 {
            for paper in sample(&pool, 2, &mut session) {
                assert!(titles.insert(paper.title.clone()), "repeat: {}", paper.title);
            }
        }
        assert_eq!(titles.len(), 10);
    }

    #[test]
    fn test_exhausted_pool_returns_fewer() {
        let pool = pool(3);
        let mut session = SampleSession::new();

        assert_eq!(sample(&pool, 2, &mut session).len(), 2);
        assert_eq!(sample(&pool, 2, &mut session).len(), 1);
        assert!(sample(&pool, 2, &mut session).is_empty());
    }

    #[test]
    fn test_no_duplicates_within_one_draw() {
        let pool = pool(5);
        let mut session = SampleSession::new();
        let drawn = sample(&pool, 5, &mut session);
        let unique: HashSet<_> = drawn.iter().map(|p| p.title.clone()).collect();
        assert_eq!(unique.len(), drawn.len());
    }

    #[test]
    fn test_session_store_prunes_idle() {
        let store = SessionStore::new(Duration::from_millis(10));
        store.with_session("a", |s| {
            s.last_active = Some(Instant::now());
        });
        assert_eq!(store.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        store.with_session("b", |_| {});
        // "a" idled out during the access above
        assert_eq!(store.len(), 1);
    }
}
