//! Hybrid vector+BM25 search over the semantic store (spec §4.1).

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{HybridHit, StorageBackend};
use crate::types::RRF_K;

/// Reciprocal rank fusion across an arbitrary number of ranked source lists
/// (spec §4.1 `RRF_score(m) = Σ_source 1/(k_rrf + rank_source(m))`).
#[must_use]
pub fn reciprocal_rank_fusion(rankings: &[Vec<Uuid>]) -> HashMap<Uuid, f64> {
    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    for ranking in rankings {
        for (rank, id) in ranking.iter().enumerate() {
            *scores.entry(*id).or_insert(0.0) += 1.0 / (RRF_K + (rank + 1) as f64);
        }
    }
    scores
}

/// Run hybrid search: fan out `over_fetch * k` candidates to the semantic
/// (vector) and lexical (BM25) paths, fuse by RRF, and return the top `k`
/// (spec §4.1 `hybrid_search`). Ties are broken by higher `quality`, then
/// newer `last_accessed`.
pub async fn hybrid_search(
    storage: &dyn StorageBackend,
    project_id: &str,
    query_text: &str,
    query_embedding: &[f32],
    k: usize,
    over_fetch: usize,
) -> Result<Vec<HybridHit>> {
    let fanout = (over_fetch.max(1)) * k.max(1);
    let semantic = storage
        .semantic_search(project_id, query_embedding, fanout)
        .await?;
    let lexical = storage.lexical_search(project_id, query_text, fanout).await?;

    let semantic_rank: Vec<Uuid> = semantic.iter().map(|(m, _)| m.id).collect();
    let lexical_rank: Vec<Uuid> = lexical.iter().map(|(m, _)| m.id).collect();
    let fused = reciprocal_rank_fusion(&[semantic_rank, lexical_rank]);

    let mut by_id: HashMap<Uuid, HybridHit> = HashMap::new();
    for (memory, score) in semantic {
        let entry = by_id.entry(memory.id).or_insert_with(|| HybridHit {
            memory: memory.clone(),
            semantic_score: 0.0,
            lexical_score: 0.0,
            rank_fusion_score: 0.0,
        });
        entry.semantic_score = score;
    }
    for (memory, score) in lexical {
        let entry = by_id.entry(memory.id).or_insert_with(|| HybridHit {
            memory: memory.clone(),
            semantic_score: 0.0,
            lexical_score: 0.0,
            rank_fusion_score: 0.0,
        });
        entry.lexical_score = score;
    }
    for hit in by_id.values_mut() {
        hit.rank_fusion_score = *fused.get(&hit.memory.id).unwrap_or(&0.0);
    }

    let mut hits: Vec<HybridHit> = by_id.into_values().collect();
    hits.sort_by(|a, b| {
        b.rank_fusion_score
            .partial_cmp(&a.rank_fusion_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.memory
                    .quality
                    .partial_cmp(&a.memory.quality)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.memory.last_accessed.cmp(&a.memory.last_accessed))
    });
    hits.truncate(k);
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrf_favours_items_ranked_high_in_both_lists() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let semantic = vec![a, b, c];
        let lexical = vec![b, a, c];
        let scores = reciprocal_rank_fusion(&[semantic, lexical]);
        assert!(scores[&a] > scores[&c]);
        assert!(scores[&b] > scores[&c]);
    }

    #[test]
    fn rrf_empty_rankings_yield_empty_scores() {
        let scores = reciprocal_rank_fusion(&[]);
        assert!(scores.is_empty());
    }
}
