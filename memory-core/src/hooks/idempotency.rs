//! Fingerprint-based idempotency guard (spec §4.4 step 1): a fire with the
//! same `hook_id + canonical context` within the idempotency window replays
//! the cached event id instead of re-executing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use super::vocabulary::{HookArgs, HookId};

/// Canonical fingerprint of one fire attempt (spec §3 "Hook event.fingerprint").
#[must_use]
pub fn fingerprint(hook_id: HookId, args: &HookArgs) -> String {
    let canonical = format!(
        "{}\u{1}{}\u{1}{}\u{1}{}",
        hook_id.as_str(),
        args.session_id,
        args.project_id,
        args.content.trim()
    );
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::hash::Hash::hash(&canonical, &mut hasher);
    format!("{:x}", std::hash::Hasher::finish(&hasher))
}

struct Entry {
    event_id: Uuid,
    fired_at: Instant,
}

/// Caches `(fingerprint -> event_id)` for `window` and replays hits within
/// it (spec §4.4 "idempotency window, default 30s").
pub struct IdempotencyGuard {
    window: Duration,
    seen: Mutex<HashMap<String, Entry>>,
}

impl IdempotencyGuard {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fingerprint; returns the cached event id if it is still
    /// within the idempotency window.
    pub fn check(&self, fp: &str) -> Option<Uuid> {
        let mut seen = self.seen.lock();
        if let Some(entry) = seen.get(fp) {
            if entry.fired_at.elapsed() < self.window {
                return Some(entry.event_id);
            }
            seen.remove(fp);
        }
        None
    }

    /// Record that `fp` produced `event_id`, starting a fresh window.
    pub fn record(&self, fp: String, event_id: Uuid) {
        self.seen.lock().insert(fp, Entry {
            event_id,
            fired_at: Instant::now(),
        });
    }
}
