//! LRU cache of recent recall envelopes, keyed by the normalised query
//! (spec §4.3 "identical queries within a short window may be served from
//! cache").

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use super::RecallEnvelope;

fn normalise_key(project_id: &str, query_text: &str, depth: u8) -> String {
    format!("{project_id}\u{1}{}\u{1}{depth}", query_text.trim().to_lowercase())
}

/// Thread-safe fixed-size cache of recent [`RecallEnvelope`]s.
pub struct QueryCache {
    inner: Mutex<LruCache<String, RecallEnvelope>>,
}

impl QueryCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn get(&self, project_id: &str, query_text: &str, depth: u8) -> Option<RecallEnvelope> {
        let key = normalise_key(project_id, query_text, depth);
        self.inner.lock().get(&key).cloned()
    }

    pub fn put(&self, project_id: &str, query_text: &str, depth: u8, envelope: RecallEnvelope) {
        let key = normalise_key(project_id, query_text, depth);
        self.inner.lock().put(key, envelope);
    }
}
