//! Turns an accepted [`PatternCandidate`] into a persisted [`Memory`] or
//! [`Procedure`] (spec §4.2 step 5 "promotion").

use chrono::{DateTime, Utc};

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::types::{Memory, Procedure, ProcedureParam};

use super::extraction::PatternCandidate;

/// Build the [`Memory`] row for a non-procedural candidate. Quality tracks
/// the inverse of extraction uncertainty; usefulness starts neutral and is
/// adjusted later by recall activations (spec §4.3 "usefulness_score").
pub async fn promote_to_memory(
    candidate: &PatternCandidate,
    content: String,
    project_id: &str,
    embedder: &dyn EmbeddingProvider,
    now: DateTime<Utc>,
) -> Result<Memory> {
    let embedding = embedder.embed(&content).await?;
    Ok(Memory {
        id: uuid::Uuid::new_v4(),
        project_id: project_id.to_string(),
        content,
        memory_type: candidate.memory_type,
        tags: Vec::new(),
        domains: Vec::new(),
        importance: (1.0 - candidate.uncertainty).clamp(0.0, 1.0),
        quality: (1.0 - candidate.uncertainty).clamp(0.0, 1.0),
        usefulness_score: 0.5,
        last_accessed: now,
        access_count: 0,
        source_event_ids: candidate.source_event_ids.clone(),
        embedding,
        created_at: now,
    })
}

/// Build the [`Procedure`] row for a procedural candidate (spec §3
/// `Procedure`, §4.2 "repeated tool sequences become procedures").
#[must_use]
pub fn promote_to_procedure(
    candidate: &PatternCandidate,
    content: String,
    project_id: &str,
    name: String,
    now: DateTime<Utc>,
) -> Procedure {
    Procedure {
        id: uuid::Uuid::new_v4(),
        project_id: project_id.to_string(),
        name,
        category: "extracted".into(),
        template: content,
        params: Vec::<ProcedureParam>::new(),
        success_rate: 1.0 - candidate.outcome_variance,
        usage_count: 0,
        avg_duration_ms: 0.0,
        trigger_pattern: None,
        examples: Vec::new(),
        source_event_ids: candidate.source_event_ids.clone(),
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::DeterministicEmbeddingProvider;
    use crate::types::MemoryType;

    fn candidate() -> PatternCandidate {
        PatternCandidate {
            content: "prefer rebase over merge on this repo".into(),
            memory_type: MemoryType::Pattern,
            is_procedural: false,
            support_count: 5,
            cohesion: 0.9,
            outcome_variance: 0.0,
            uncertainty: 0.1,
            source_event_ids: vec![uuid::Uuid::new_v4()],
        }
    }

    #[tokio::test]
    async fn promoted_memory_carries_source_events_and_quality() {
        let embedder = DeterministicEmbeddingProvider::new(32);
        let candidate = candidate();
        let memory = promote_to_memory(&candidate, candidate.content.clone(), "proj", &embedder, Utc::now())
            .await
            .unwrap();
        assert_eq!(memory.source_event_ids, candidate.source_event_ids);
        assert!((memory.quality - 0.9).abs() < 1e-9);
        assert_eq!(memory.embedding.len(), 32);
    }

    #[test]
    fn promoted_procedure_uses_outcome_variance_for_success_rate() {
        let candidate = candidate();
        let procedure = promote_to_procedure(&candidate, candidate.content.clone(), "proj", "seq".into(), Utc::now());
        assert!((procedure.success_rate - 1.0).abs() < 1e-9);
    }
}
