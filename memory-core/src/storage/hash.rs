//! Canonical event-content hashing for dedup (spec §4.1, §8 invariants).
//!
//! `hash` is computed over `(project_id, session_id, event_type,
//! normalized_content, context)`; it must be deterministic so ingesting the
//! same payload twice always yields the same hash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::types::{EventContext, EventType};

/// Normalize content for hashing: trim and collapse internal whitespace so
/// cosmetic differences (trailing newline, double space) do not defeat dedup.
fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute the canonical content fingerprint for an event (spec §4.1).
#[must_use]
pub fn compute_event_hash(
    project_id: &str,
    session_id: &str,
    event_type: EventType,
    content: &str,
    context: &EventContext,
) -> String {
    let mut hasher = DefaultHasher::new();
    project_id.hash(&mut hasher);
    session_id.hash(&mut hasher);
    (event_type as u8 as u64 + discriminant(event_type)).hash(&mut hasher);
    normalize_content(content).hash(&mut hasher);
    context.task.hash(&mut hasher);
    context.cwd.hash(&mut hasher);
    let mut files = context.files.clone();
    files.sort();
    files.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn discriminant(event_type: EventType) -> u64 {
    match event_type {
        EventType::Action => 0,
        EventType::Observation => 1,
        EventType::Decision => 2,
        EventType::Error => 3,
        EventType::Success => 4,
        EventType::Conversation => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_for_identical_payloads() {
        let ctx = EventContext::default();
        let h1 = compute_event_hash("p", "s", EventType::Action, "ran tests", &ctx);
        let h2 = compute_event_hash("p", "s", EventType::Action, "ran tests", &ctx);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_ignores_cosmetic_whitespace() {
        let ctx = EventContext::default();
        let h1 = compute_event_hash("p", "s", EventType::Action, "ran tests", &ctx);
        let h2 = compute_event_hash("p", "s", EventType::Action, "  ran   tests\n", &ctx);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_differs_on_session() {
        let ctx = EventContext::default();
        let h1 = compute_event_hash("p", "s1", EventType::Action, "ran tests", &ctx);
        let h2 = compute_event_hash("p", "s2", EventType::Action, "ran tests", &ctx);
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_differs_on_event_type() {
        let ctx = EventContext::default();
        let h1 = compute_event_hash("p", "s", EventType::Action, "x", &ctx);
        let h2 = compute_event_hash("p", "s", EventType::Observation, "x", &ctx);
        assert_ne!(h1, h2);
    }
}
