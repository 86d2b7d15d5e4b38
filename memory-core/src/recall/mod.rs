//! Tiered cascading recall (spec §4.3).
//!
//! Tier 1 (working memory + exact recency) is attempted first and is nearly
//! free; Tier 2 (hybrid vector+lexical search) runs when Tier 1 is thin;
//! Tier 3 (LLM synthesis grounded in the Tier 2 hits) runs only when asked
//! for explicitly or Tier 2 confidence is still low. Each tier has its own
//! deadline (spec §4.3 `tier*_deadline_ms`) so a slow backend degrades to a
//! lower tier's answer instead of hanging the caller.

pub mod cache;
pub mod classify;
pub mod rescoring;

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::RecallConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::llm::{CompletionRequest, LlmClient};
use crate::search::fuzzy_rank;
use crate::semantic::hybrid_search;
use crate::storage::StorageBackend;
use crate::types::{Confidence, ItemRef, Layer, QueryType};
use crate::working_memory::WorkingMemoryBuffer;

pub use classify::classify;
pub use rescoring::{composite_score, derive_confidence, recency_score};

/// One ranked recall hit, carrying enough provenance to explain itself
/// (spec §4.3 "explanation").
#[derive(Debug, Clone)]
pub struct RecallHit {
    pub item_ref: ItemRef,
    pub content: String,
    pub semantic_score: f64,
    pub recency_score: f64,
    pub usefulness: f64,
    pub composite_score: f64,
    pub from_working_memory: bool,
}

/// The full result of one `recall` call (spec §4.3).
#[derive(Debug, Clone)]
pub struct RecallEnvelope {
    pub hits: Vec<RecallHit>,
    pub tier_reached: u8,
    pub confidence: Confidence,
    pub cache_hit: bool,
}

/// Explain why a hit was included, in prose (spec §4.3 "explanation field").
#[must_use]
pub fn explain_hit(hit: &RecallHit) -> String {
    if hit.from_working_memory {
        format!(
            "Surfaced from working memory (composite {:.2}).",
            hit.composite_score
        )
    } else {
        format!(
            "Ranked by semantic similarity ({:.2}), recency ({:.2}), and usefulness ({:.2}) into composite {:.2}.",
            hit.semantic_score, hit.recency_score, hit.usefulness, hit.composite_score
        )
    }
}

async fn tier1_working_memory(
    buffer: &WorkingMemoryBuffer,
    storage: &dyn StorageBackend,
    config: &RecallConfig,
    now: chrono::DateTime<Utc>,
) -> Result<Vec<RecallHit>> {
    let mut hits = Vec::new();
    for slot in buffer.slots() {
        let ItemRef { layer, id } = slot.item_ref;
        if layer != Layer::Semantic {
            continue;
        }
        let Some(memory) = storage.get_memory(id).await? else {
            continue;
        };
        let age_days = (now - memory.last_accessed).num_seconds() as f64 / 86_400.0;
        let breakdown = rescoring::score(slot.salience, age_days, memory.usefulness_score, config);
        hits.push(RecallHit {
            item_ref: slot.item_ref,
            content: memory.content,
            semantic_score: breakdown.semantic,
            recency_score: breakdown.recency,
            usefulness: breakdown.usefulness,
            composite_score: breakdown.composite,
            from_working_memory: true,
        });
    }
    hits.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(hits)
}

async fn tier2_hybrid(
    storage: &dyn StorageBackend,
    embedder: &dyn EmbeddingProvider,
    project_id: &str,
    query_text: &str,
    config: &RecallConfig,
    k: usize,
    now: chrono::DateTime<Utc>,
) -> Result<Vec<RecallHit>> {
    let embedding = embedder.embed(query_text).await?;
    let fused = hybrid_search(storage, project_id, query_text, &embedding, k, config.over_fetch).await?;

    let hits = if fused.is_empty() {
        let memories = storage
            .list_memories(project_id, &crate::storage::MemoryFilter::default(), 256)
            .await?;
        let candidates: Vec<(Uuid, &str)> = memories.iter().map(|m| (m.id, m.content.as_str())).collect();
        let fuzzy = fuzzy_rank(query_text, &candidates, k, 0.75);
        let by_id: std::collections::HashMap<_, _> = memories.into_iter().map(|m| (m.id, m)).collect();
        fuzzy
            .into_iter()
            .filter_map(|(id, score)| by_id.get(&id).cloned().map(|m| (m, score)))
            .map(|(memory, fuzzy_score)| {
                let age_days = (now - memory.last_accessed).num_seconds() as f64 / 86_400.0;
                let breakdown = rescoring::score(fuzzy_score, age_days, memory.usefulness_score, config);
                RecallHit {
                    item_ref: ItemRef { layer: Layer::Semantic, id: memory.id },
                    content: memory.content,
                    semantic_score: breakdown.semantic,
                    recency_score: breakdown.recency,
                    usefulness: breakdown.usefulness,
                    composite_score: breakdown.composite,
                    from_working_memory: false,
                }
            })
            .collect()
    } else {
        fused
            .into_iter()
            .map(|hit| {
                let age_days = (now - hit.memory.last_accessed).num_seconds() as f64 / 86_400.0;
                let breakdown = rescoring::score(hit.rank_fusion_score, age_days, hit.memory.usefulness_score, config);
                RecallHit {
                    item_ref: ItemRef { layer: Layer::Semantic, id: hit.memory.id },
                    content: hit.memory.content,
                    semantic_score: breakdown.semantic,
                    recency_score: breakdown.recency,
                    usefulness: breakdown.usefulness,
                    composite_score: breakdown.composite,
                    from_working_memory: false,
                }
            })
            .collect()
    };
    Ok(hits)
}

async fn tier3_synthesis(
    llm: &dyn LlmClient,
    query_text: &str,
    hits: &[RecallHit],
    deadline: Duration,
) -> Option<String> {
    if !llm.is_available() {
        return None;
    }
    let context: String = hits
        .iter()
        .take(5)
        .map(|h| format!("- {}", h.content))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!("Question: {query_text}\nGrounded context:\n{context}\nSynthesize a grounded answer.");
    let request = CompletionRequest {
        prompt,
        schema: None,
        max_tokens: 512,
        deadline,
    };
    match tokio::time::timeout(deadline, llm.complete(request)).await {
        Ok(Ok(response)) => response.text,
        _ => None,
    }
}

/// Run the full tiered cascade for one query (spec §4.3).
#[allow(clippy::too_many_arguments)]
pub async fn recall(
    storage: &dyn StorageBackend,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmClient,
    buffer: &WorkingMemoryBuffer,
    cache: &cache::QueryCache,
    config: &RecallConfig,
    project_id: &str,
    query_text: &str,
    depth: u8,
    k: usize,
) -> Result<RecallEnvelope> {
    let depth = depth.clamp(1, 3);
    if query_text.trim().is_empty() {
        return Ok(RecallEnvelope {
            hits: Vec::new(),
            tier_reached: 0,
            confidence: derive_confidence(0.0, 0.0, 0.0, &[], 0, k),
            cache_hit: false,
        });
    }

    if let Some(mut cached) = cache.get(project_id, query_text, depth) {
        cached.cache_hit = true;
        return Ok(cached);
    }

    let now = Utc::now();
    let query_type = classify(query_text);

    let mut tier_reached = 1;
    let mut hits = tier1_working_memory(buffer, storage, config, now).await?;

    if hits.len() < k && depth >= 2 {
        tier_reached = 2;
        let tier2 = tokio::time::timeout(
            Duration::from_millis(config.tier2_deadline_ms),
            tier2_hybrid(storage, embedder, project_id, query_text, config, k, now),
        )
        .await;
        if let Ok(Ok(mut tier2_hits)) = tier2 {
            let seen: std::collections::HashSet<Uuid> = hits.iter().map(|h| h.item_ref.id).collect();
            tier2_hits.retain(|h| !seen.contains(&h.item_ref.id));
            hits.extend(tier2_hits);
        }
    }

    hits.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(k.max(1));

    let top_fused = hits.first().map(|h| h.composite_score).unwrap_or(0.0);
    let mean_quality = if hits.is_empty() { 0.0 } else { hits.iter().map(|h| h.usefulness).sum::<f64>() / hits.len() as f64 };
    let mean_recency = if hits.is_empty() { 0.0 } else { hits.iter().map(|h| h.recency_score).sum::<f64>() / hits.len() as f64 };
    let composite_scores: Vec<f64> = hits.iter().map(|h| h.composite_score).collect();
    let mut confidence = derive_confidence(top_fused, mean_quality, mean_recency, &composite_scores, hits.len(), k);

    let low_confidence_needs_synthesis = matches!(query_type, QueryType::Factual | QueryType::Planning)
        && confidence.overall < 0.5;
    if depth >= 3 && (low_confidence_needs_synthesis || hits.is_empty()) {
        tier_reached = 3;
        let deadline = Duration::from_millis(config.tier3_deadline_ms);
        if let Some(synthesis) = tier3_synthesis(llm, query_text, &hits, deadline).await {
            hits.insert(
                0,
                RecallHit {
                    item_ref: ItemRef { layer: Layer::Semantic, id: Uuid::new_v4() },
                    content: synthesis,
                    semantic_score: confidence.semantic_relevance,
                    recency_score: 1.0,
                    usefulness: 0.5,
                    composite_score: confidence.overall,
                    from_working_memory: false,
                },
            );
            confidence = Confidence::compute(
                confidence.semantic_relevance,
                confidence.source_quality,
                confidence.recency,
                confidence.consistency,
                1.0,
            );
        }
    }

    let envelope = RecallEnvelope {
        hits,
        tier_reached,
        confidence,
        cache_hit: false,
    };
    cache.put(project_id, query_text, depth, envelope.clone());
    Ok(envelope)
}

/// Reinforce the working-memory slot for a memory that was just recalled
/// (spec §4.3 "activation side effects", §4.5 reinforcement).
pub fn record_activation(buffer: &mut WorkingMemoryBuffer, hit: &RecallHit, now: chrono::DateTime<Utc>) {
    if !buffer.reinforce(hit.item_ref, now) {
        buffer.insert(hit.item_ref, hit.composite_score, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecallConfig;
    use crate::llm::MockLlmClient;
    use crate::types::{Confidence as ConfidenceType, WorkingMemoryConfig};

    #[test]
    fn explain_mentions_working_memory_when_applicable() {
        let hit = RecallHit {
            item_ref: ItemRef { layer: Layer::Semantic, id: Uuid::new_v4() },
            content: "x".into(),
            semantic_score: 0.5,
            recency_score: 0.5,
            usefulness: 0.5,
            composite_score: 0.5,
            from_working_memory: true,
        };
        assert!(explain_hit(&hit).contains("working memory"));
    }

    #[tokio::test]
    async fn empty_query_returns_empty_result_not_an_error() {
        let storage = crate::test_support::NullStorage;
        let embedder = crate::embeddings::DeterministicEmbeddingProvider::new(8);
        let llm = MockLlmClient::default();
        let buffer = WorkingMemoryBuffer::new(WorkingMemoryConfig::default());
        let cache = cache::QueryCache::new(4);
        let envelope = recall(&storage, &embedder, &llm, &buffer, &cache, &RecallConfig::default(), "p", "  ", 2, 5)
            .await
            .unwrap();
        assert!(envelope.hits.is_empty());
        assert_eq!(envelope.tier_reached, 0);
    }

    #[tokio::test]
    async fn out_of_range_depth_is_clamped_not_rejected() {
        let storage = crate::test_support::NullStorage;
        let embedder = crate::embeddings::DeterministicEmbeddingProvider::new(8);
        let llm = MockLlmClient::default();
        let buffer = WorkingMemoryBuffer::new(WorkingMemoryConfig::default());
        let cache = cache::QueryCache::new(4);
        let envelope = recall(&storage, &embedder, &llm, &buffer, &cache, &RecallConfig::default(), "p", "token expiry", 9, 5)
            .await
            .unwrap();
        assert!(envelope.tier_reached <= 3);
    }

    #[test]
    fn confidence_type_reexport_compiles() {
        let _ = ConfidenceType::compute(1.0, 1.0, 1.0, 1.0, 1.0);
    }
}
