//! Knowledge-graph community detection (spec §4.1 `community_detect`).
//!
//! A single-pass, greedy modularity optimisation in the spirit of Louvain:
//! repeatedly move each node into the neighbouring community that yields the
//! largest modularity gain until no move improves it. Runs on an undirected
//! projection where edge weight is `strength * confidence` (spec §4.1).

use std::collections::HashMap;
use uuid::Uuid;

use crate::storage::Community;
use crate::types::Relation;

struct Graph {
    nodes: Vec<Uuid>,
    index: HashMap<Uuid, usize>,
    adjacency: Vec<HashMap<usize, f64>>,
    total_weight: f64,
}

fn build_graph(relations: &[Relation]) -> Graph {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut nodes = Vec::new();
    for rel in relations {
        for entity in [rel.from_entity, rel.to_entity] {
            index.entry(entity).or_insert_with(|| {
                nodes.push(entity);
                nodes.len() - 1
            });
        }
    }
    let mut adjacency = vec![HashMap::new(); nodes.len()];
    let mut total_weight = 0.0;
    for rel in relations {
        let weight = rel.strength * rel.confidence;
        let a = index[&rel.from_entity];
        let b = index[&rel.to_entity];
        if a == b {
            continue;
        }
        *adjacency[a].entry(b).or_insert(0.0) += weight;
        *adjacency[b].entry(a).or_insert(0.0) += weight;
        total_weight += weight;
    }
    Graph {
        nodes,
        index,
        adjacency,
        total_weight,
    }
}

/// Detect communities over the given relations and return a partition of
/// entity ids (spec §4.1). Returns an empty vector for an empty graph.
#[must_use]
pub fn community_detect(relations: &[Relation]) -> Vec<Community> {
    let graph = build_graph(relations);
    if graph.nodes.is_empty() {
        return Vec::new();
    }
    let n = graph.nodes.len();
    let mut community_of: Vec<usize> = (0..n).collect();
    let degree: Vec<f64> = graph.adjacency.iter().map(|m| m.values().sum()).collect();
    let m2 = (2.0 * graph.total_weight).max(1e-9);

    let mut improved = true;
    let mut passes = 0;
    while improved && passes < 20 {
        improved = false;
        passes += 1;
        for i in 0..n {
            let current = community_of[i];
            let mut gains: HashMap<usize, f64> = HashMap::new();
            for (&j, &w) in &graph.adjacency[i] {
                *gains.entry(community_of[j]).or_insert(0.0) += w;
            }
            let mut best_comm = current;
            let mut best_gain = gains.get(&current).copied().unwrap_or(0.0);
            for (&comm, &weight_to_comm) in &gains {
                let comm_degree: f64 = (0..n)
                    .filter(|&k| community_of[k] == comm && k != i)
                    .map(|k| degree[k])
                    .sum();
                let gain = weight_to_comm - degree[i] * comm_degree / m2;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = comm;
                }
            }
            if best_comm != current {
                community_of[i] = best_comm;
                improved = true;
            }
        }
    }

    let mut grouped: HashMap<usize, Vec<Uuid>> = HashMap::new();
    for (i, &comm) in community_of.iter().enumerate() {
        grouped.entry(comm).or_default().push(graph.nodes[i]);
    }
    grouped
        .into_iter()
        .enumerate()
        .map(|(id, (_, entity_ids))| Community { id, entity_ids })
        .collect()
}

/// Strengthen `strength` by a decaying moving average on re-insert (spec
/// §4.1 `upsert_relation`).
#[must_use]
pub fn decay_moving_average(existing_strength: f64, new_observation: f64, alpha: f64) -> f64 {
    (alpha * existing_strength + (1.0 - alpha) * new_observation).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn relation(from: Uuid, to: Uuid, strength: f64) -> Relation {
        Relation {
            id: Uuid::new_v4(),
            project_id: "p".into(),
            from_entity: from,
            to_entity: to,
            relation_type: "relates_to".into(),
            strength,
            confidence: 1.0,
            valid_from: Utc::now(),
            valid_to: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn two_disconnected_triangles_form_two_communities() {
        let a1 = Uuid::new_v4();
        let a2 = Uuid::new_v4();
        let a3 = Uuid::new_v4();
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();
        let b3 = Uuid::new_v4();
        let relations = vec![
            relation(a1, a2, 0.9),
            relation(a2, a3, 0.9),
            relation(a1, a3, 0.9),
            relation(b1, b2, 0.9),
            relation(b2, b3, 0.9),
            relation(b1, b3, 0.9),
        ];
        let communities = community_detect(&relations);
        assert_eq!(communities.len(), 2);
        for community in &communities {
            assert_eq!(community.entity_ids.len(), 3);
        }
    }

    #[test]
    fn empty_graph_has_no_communities() {
        assert!(community_detect(&[]).is_empty());
    }

    #[test]
    fn decay_moving_average_pulls_toward_new_observation() {
        let s = decay_moving_average(0.2, 1.0, 0.5);
        assert!((s - 0.6).abs() < 1e-9);
    }
}
