//! System 1 (fast, statistical) event clustering (spec §4.2 step 2).

use uuid::Uuid;

use crate::types::Event;

/// Cosine similarity between two embeddings; `0.0` if either is missing or
/// the vectors have mismatched length.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (norm_a * norm_b))
}

/// Exponential-decay temporal similarity with configurable half-life (spec
/// §4.2 "temporal (exponential decay, half-life configurable, default 30 min)").
#[must_use]
pub fn temporal_similarity(delta_minutes: f64, half_life_min: f64) -> f64 {
    if half_life_min <= 0.0 {
        return 0.0;
    }
    (-delta_minutes.abs() * std::f64::consts::LN_2 / half_life_min).exp()
}

/// Weighted proximity distance between two events; lower means more similar.
/// Combines temporal decay, session identity, and embedding cosine
/// similarity (spec §4.2 step 2).
#[must_use]
pub fn composite_distance(a: &Event, b: &Event, half_life_min: f64) -> f64 {
    let delta_minutes = (b.timestamp - a.timestamp).num_seconds() as f64 / 60.0;
    let temporal = temporal_similarity(delta_minutes, half_life_min);
    let same_session = f64::from(u8::from(a.session_id == b.session_id));
    let embedding_sim = match (&a.embedding, &b.embedding) {
        (Some(ea), Some(eb)) => cosine_similarity(ea, eb),
        _ => 0.0,
    };
    let similarity = 0.4 * temporal + 0.2 * same_session + 0.4 * embedding_sim;
    1.0 - similarity
}

/// One cluster: the ids of the events that were grouped together.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub event_ids: Vec<Uuid>,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Group events by pairwise composite distance below `tau` (spec §4.2
/// "A pair joins the same cluster when weighted distance < threshold τ₁").
///
/// This is a straightforward O(n²) union-find over all pairs; the locality-
/// sensitive bucketing spec §4.2 names as a complexity budget is an
/// optimisation of this same join rule, not a change to its semantics, and
/// is left as a future optimisation for larger event volumes.
#[must_use]
pub fn cluster_events(events: &[Event], tau: f64, half_life_min: f64) -> Vec<Cluster> {
    if events.is_empty() {
        return Vec::new();
    }
    let mut uf = UnionFind::new(events.len());
    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            if composite_distance(&events[i], &events[j], half_life_min) < tau {
                uf.union(i, j);
            }
        }
    }
    let mut groups: std::collections::HashMap<usize, Vec<Uuid>> = std::collections::HashMap::new();
    for i in 0..events.len() {
        let root = uf.find(i);
        groups.entry(root).or_default().push(events[i].id);
    }
    groups
        .into_values()
        .map(|event_ids| Cluster { event_ids })
        .collect()
}

/// Cohesion of a cluster: average pairwise similarity (`1 - distance`)
/// among its members (spec §4.2 step 3 "cluster cohesion").
#[must_use]
pub fn cluster_cohesion(cluster_events: &[&Event], half_life_min: f64) -> f64 {
    if cluster_events.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..cluster_events.len() {
        for j in (i + 1)..cluster_events.len() {
            total += 1.0 - composite_distance(cluster_events[i], cluster_events[j], half_life_min);
            pairs += 1;
        }
    }
    total / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventContext, EventType, Outcome};
    use chrono::Utc;

    fn event_at(session: &str, offset_min: i64, embedding: Option<Vec<f32>>) -> Event {
        let now = Utc::now();
        let mut e = Event::new(
            "p",
            session,
            EventType::Action,
            "x",
            Outcome::Success,
            EventContext::default(),
            now + chrono::Duration::minutes(offset_min),
        );
        e.timestamp = now + chrono::Duration::minutes(offset_min);
        e.embedding = embedding;
        e
    }

    #[test]
    fn close_events_in_same_session_cluster_together() {
        let events = vec![
            event_at("s1", 0, Some(vec![1.0, 0.0])),
            event_at("s1", 1, Some(vec![1.0, 0.0])),
            event_at("s2", 1000, Some(vec![0.0, 1.0])),
        ];
        let clusters = cluster_events(&events, 0.35, 30.0);
        assert_eq!(clusters.len(), 2);
        let sizes: Vec<usize> = clusters.iter().map(|c| c.event_ids.len()).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_events(&[], 0.35, 30.0).is_empty());
    }

    #[test]
    fn cohesion_of_singleton_is_one() {
        let e = event_at("s1", 0, None);
        assert_eq!(cluster_cohesion(&[&e], 30.0), 1.0);
    }

    #[test]
    fn temporal_similarity_decays_with_distance() {
        let near = temporal_similarity(1.0, 30.0);
        let far = temporal_similarity(300.0, 30.0);
        assert!(near > far);
    }
}
