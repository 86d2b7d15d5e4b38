//! Shared test fixtures for the memory engine workspace: data builders for
//! every entity in the model plus a ready-to-use [`EngineContext`] wired to
//! an in-process clock, deterministic embedder, and mock LLM.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use memory_core::clock::FixedClock;
use memory_core::config::EngineConfig;
use memory_core::context::EngineContext;
use memory_core::embeddings::{DeterministicEmbeddingProvider, EmbeddingProvider};
use memory_core::llm::MockLlmClient;
use memory_core::types::{
    Entity, Event, EventContext, EventType, Goal, ItemRef, Layer, Memory, MemoryType, Observation,
    Outcome, Phase, Priority, Procedure, ProcedureParam, Relation, Task, TaskStatus,
};

/// Build an [`EngineContext`] around a caller-supplied storage backend, a
/// [`FixedClock`] started at `now`, a [`DeterministicEmbeddingProvider`], and
/// an always-available [`MockLlmClient`].
#[must_use]
pub fn test_context(storage: Arc<dyn memory_core::storage::StorageBackend>, now: DateTime<Utc>) -> EngineContext {
    EngineContext::new(
        storage,
        Arc::new(DeterministicEmbeddingProvider::default()),
        Arc::new(MockLlmClient::default()),
        Arc::new(FixedClock::new(now)),
        EngineConfig::default(),
    )
}

/// Open a fresh [`memory_storage::RedbStorage`] backed by a temp file that is
/// deleted when the returned [`tempfile::TempDir`] is dropped.
pub async fn open_temp_storage() -> anyhow::Result<(memory_storage::RedbStorage, tempfile::TempDir)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("memory.redb");
    let storage = memory_storage::RedbStorage::open(&path).await?;
    Ok((storage, dir))
}

/// Build a minimal active event with default weights.
#[must_use]
pub fn create_test_event(project_id: &str, session_id: &str, content: &str, now: DateTime<Utc>) -> Event {
    Event::new(project_id, session_id, EventType::Action, content, Outcome::Success, EventContext::default(), now)
}

/// Build a batch of events sharing a project and session, useful for
/// exercising range queries and consolidation windows.
#[must_use]
pub fn create_test_events(project_id: &str, session_id: &str, count: usize, now: DateTime<Utc>) -> Vec<Event> {
    (0..count).map(|i| create_test_event(project_id, session_id, &format!("event {i}"), now)).collect()
}

/// Build a memory with a deterministic embedding derived from its content,
/// so callers exercising semantic search get realistic ranking behaviour.
pub async fn create_test_memory(project_id: &str, content: &str, now: DateTime<Utc>) -> Memory {
    let embedder = DeterministicEmbeddingProvider::default();
    let embedding = embedder.embed(content).await.unwrap_or_else(|_| vec![0.0; embedder.dimension()]);
    Memory {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        content: content.to_string(),
        memory_type: MemoryType::Fact,
        tags: vec![],
        domains: vec![],
        importance: 0.5,
        quality: 0.5,
        usefulness_score: 0.5,
        last_accessed: now,
        access_count: 0,
        source_event_ids: vec![],
        embedding,
        created_at: now,
    }
}

/// Build a named procedure template with no execution history yet.
#[must_use]
pub fn create_test_procedure(project_id: &str, name: &str, now: DateTime<Utc>) -> Procedure {
    Procedure {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        name: name.to_string(),
        category: "general".to_string(),
        template: format!("run {name}"),
        params: vec![ProcedureParam { name: "target".to_string(), param_type: "string".to_string(), required: true, default: None }],
        success_rate: 0.0,
        usage_count: 0,
        avg_duration_ms: 0.0,
        trigger_pattern: None,
        examples: vec![],
        source_event_ids: vec![],
        created_at: now,
    }
}

/// Build a pending task with no goal attached.
#[must_use]
pub fn create_test_task(project_id: &str, content: &str, now: DateTime<Utc>) -> Task {
    Task {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        content: content.to_string(),
        priority: Priority::Medium,
        status: TaskStatus::Pending,
        phase: Phase::Planning,
        assignee: None,
        due_at: None,
        triggers: vec![],
        goal_id: None,
        completed_at: None,
        created_at: now,
    }
}

/// Build a goal with no tasks attached yet.
#[must_use]
pub fn create_test_goal(project_id: &str, name: &str, now: DateTime<Utc>) -> Goal {
    Goal {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        name: name.to_string(),
        description: format!("goal: {name}"),
        progress: 0,
        task_ids: vec![],
        created_at: now,
    }
}

/// Build a graph entity of the given type.
#[must_use]
pub fn create_test_entity(project_id: &str, name: &str, entity_type: &str, now: DateTime<Utc>) -> Entity {
    Entity { id: Uuid::new_v4(), project_id: project_id.to_string(), name: name.to_string(), entity_type: entity_type.to_string(), metadata: serde_json::json!({}), created_at: now }
}

/// Build a relation edge with moderate initial strength and confidence.
#[must_use]
pub fn create_test_relation(project_id: &str, from_entity: Uuid, to_entity: Uuid, relation_type: &str, now: DateTime<Utc>) -> Relation {
    Relation {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        from_entity,
        to_entity,
        relation_type: relation_type.to_string(),
        strength: 0.5,
        confidence: 0.5,
        valid_from: now,
        valid_to: None,
        created_at: now,
    }
}

/// Build an observation attached to `entity_id`.
#[must_use]
pub fn create_test_observation(entity_id: Uuid, content: &str, now: DateTime<Utc>) -> Observation {
    Observation { id: Uuid::new_v4(), entity_id, content: content.to_string(), timestamp: now, confidence: 0.8, superseded_by: None }
}

/// An [`ItemRef`] into the semantic layer, the common case in working-memory tests.
#[must_use]
pub fn semantic_ref(id: Uuid) -> ItemRef {
    ItemRef { layer: Layer::Semantic, id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_test_event_defaults_to_success_action() {
        let now = Utc::now();
        let event = create_test_event("p1", "s1", "did a thing", now);
        assert_eq!(event.event_type, EventType::Action);
        assert_eq!(event.outcome, Outcome::Success);
        assert_eq!(event.lifecycle_status, memory_core::types::LifecycleStatus::Active);
    }

    #[tokio::test]
    async fn create_test_memory_embeds_content() {
        let memory = create_test_memory("p1", "retries capped at 3", Utc::now()).await;
        assert_eq!(memory.embedding.len(), memory_core::types::DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn create_test_task_starts_in_planning() {
        let task = create_test_task("p1", "write the migration", Utc::now());
        assert_eq!(task.phase, Phase::Planning);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn open_temp_storage_round_trips_an_event() {
        let (storage, _dir) = open_temp_storage().await.unwrap();
        let event = create_test_event("p1", "s1", "hello", Utc::now());
        let id = event.id;
        let (returned_id, duplicate) = memory_core::storage::StorageBackend::append_event(&storage, event).await.unwrap();
        assert_eq!(returned_id, id);
        assert!(!duplicate);
    }
}
