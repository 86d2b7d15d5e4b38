//! Event-log capacity management, generalising the teacher's
//! `episodic::capacity::{CapacityManager, EvictionPolicy}` (SPEC_FULL §2).

use uuid::Uuid;

use crate::types::{Event, EvictionPolicy};

/// A candidate for capacity-driven eviction, paired with the composite score
/// used to rank it (higher survives).
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub event_id: Uuid,
    pub score: f64,
}

/// Compute the composite survival score for an event under a policy.
/// `RelevanceWeighted` blends `consolidation_score`/`importance_score` with
/// recency; `Lru` uses only recency (SPEC_FULL §2).
#[must_use]
pub fn survival_score(event: &Event, policy: EvictionPolicy, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let age_days = (now - event.last_activation).num_seconds() as f64 / 86_400.0;
    let recency = (-age_days / 30.0).exp();
    match policy {
        EvictionPolicy::Lru => recency,
        EvictionPolicy::RelevanceWeighted => {
            let quality = event.consolidation_score.max(event.importance_score);
            0.5 * quality + 0.5 * recency
        }
    }
}

/// Given a set of events over a hard capacity limit, return the ids that
/// should be evicted (lowest-scoring first) to bring the set back to
/// `capacity`.
#[must_use]
pub fn select_evictions(
    events: &[Event],
    capacity: usize,
    policy: EvictionPolicy,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<Uuid> {
    if events.len() <= capacity {
        return Vec::new();
    }
    let mut scored: Vec<EvictionCandidate> = events
        .iter()
        .map(|e| EvictionCandidate {
            event_id: e.id,
            score: survival_score(e, policy, now),
        })
        .collect();
    scored.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
    let overflow = events.len() - capacity;
    scored.into_iter().take(overflow).map(|c| c.event_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventContext, EventType, LifecycleStatus, Outcome};
    use chrono::{Duration, Utc};

    fn make_event(last_activation: chrono::DateTime<Utc>, importance: f64) -> Event {
        let now = Utc::now();
        let mut e = Event::new(
            "p",
            "s",
            EventType::Action,
            "content",
            Outcome::Success,
            EventContext::default(),
            now,
        );
        e.last_activation = last_activation;
        e.importance_score = importance;
        e.lifecycle_status = LifecycleStatus::Active;
        e
    }

    #[test]
    fn under_capacity_evicts_nothing() {
        let now = Utc::now();
        let events = vec![make_event(now, 0.1), make_event(now, 0.1)];
        assert!(select_evictions(&events, 5, EvictionPolicy::Lru, now).is_empty());
    }

    #[test]
    fn relevance_weighted_keeps_important_recent_events() {
        let now = Utc::now();
        let stale_low = make_event(now - Duration::days(60), 0.1);
        let fresh_high = make_event(now, 0.9);
        let events = vec![stale_low.clone(), fresh_high.clone()];
        let evicted = select_evictions(&events, 1, EvictionPolicy::RelevanceWeighted, now);
        assert_eq!(evicted, vec![stale_low.id]);
    }
}
