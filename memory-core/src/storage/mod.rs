//! Unified storage-backend trait (spec §4.1).
//!
//! A single trait spans the event log, semantic store, graph store, and
//! task store so the rest of the engine is backend-agnostic; `memory-storage`
//! provides the one concrete (embedded, `redb`) implementation built here.
//! A networked relational backend is a deployment decision left open by
//! spec §9 — only this trait boundary is specified.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    Cursor, Entity, Event, Goal, LifecycleStatus, Memory, Observation, Procedure,
    ProcedureExecution, Relation, Task,
};

/// Filters accepted by `get_range` (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub session_id: Option<String>,
    pub lifecycle_status: Option<LifecycleStatus>,
}

/// Filters accepted by semantic-memory listing operations.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    pub memory_type: Option<crate::types::MemoryType>,
    pub tag: Option<String>,
    pub domain: Option<String>,
}

/// One fused hybrid-search hit (spec §4.1 `hybrid_search`).
#[derive(Debug, Clone)]
pub struct HybridHit {
    pub memory: Memory,
    pub semantic_score: f64,
    pub lexical_score: f64,
    pub rank_fusion_score: f64,
}

/// A partition produced by community detection (spec §4.1 `community_detect`).
#[derive(Debug, Clone)]
pub struct Community {
    pub id: usize,
    pub entity_ids: Vec<Uuid>,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    // ---- Event log (spec §4.1 "Event log") ----

    /// Append an event, computing and checking its content hash. Returns
    /// `(id, deduplicated)`; a duplicate hash returns the *original* id with
    /// `deduplicated = true` rather than an error (spec §7 `CONFLICT`).
    async fn append_event(&self, event: Event) -> Result<(Uuid, bool)>;

    async fn get_event(&self, project_id: &str, id: Uuid) -> Result<Option<Event>>;

    async fn get_range(
        &self,
        project_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &EventFilter,
    ) -> Result<Vec<Event>>;

    async fn get_by_session(&self, project_id: &str, session_id: &str) -> Result<Vec<Event>>;

    async fn update_lifecycle(
        &self,
        id: Uuid,
        status: LifecycleStatus,
        consolidation_score: f64,
    ) -> Result<()>;

    async fn increment_activation(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Events eligible for archival: `consolidated` and `last_activation`
    /// older than `retention_days` (spec §4.1 "Retention").
    async fn archive_eligible(
        &self,
        project_id: &str,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    // ---- Semantic store with hybrid search (spec §4.1) ----

    async fn upsert_memory(&self, memory: Memory) -> Result<Uuid>;

    async fn get_memory(&self, id: Uuid) -> Result<Option<Memory>>;

    async fn list_memories(
        &self,
        project_id: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<Memory>>;

    /// Vector-only nearest neighbours over `embedding`.
    async fn semantic_search(
        &self,
        project_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(Memory, f64)>>;

    /// BM25-style lexical search over `content`.
    async fn lexical_search(
        &self,
        project_id: &str,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<(Memory, f64)>>;

    async fn touch_memory_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn update_memory_usefulness(&self, id: Uuid, usefulness_score: f64) -> Result<()>;

    // ---- Procedural store ----

    async fn upsert_procedure(&self, procedure: Procedure) -> Result<Uuid>;

    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>>;

    async fn get_procedure_by_name(
        &self,
        project_id: &str,
        name: &str,
    ) -> Result<Option<Procedure>>;

    async fn list_procedures(&self, project_id: &str, limit: usize) -> Result<Vec<Procedure>>;

    async fn record_execution(&self, execution: ProcedureExecution) -> Result<Uuid>;

    // ---- Prospective store (tasks/goals) ----

    async fn upsert_task(&self, task: Task) -> Result<Uuid>;

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>>;

    async fn pending_tasks(&self, project_id: &str) -> Result<Vec<Task>>;

    async fn tasks_by_goal(&self, goal_id: Uuid) -> Result<Vec<Task>>;

    async fn blocking_tasks(&self, project_id: &str) -> Result<Vec<Task>>;

    async fn overdue_tasks(&self, project_id: &str, now: DateTime<Utc>) -> Result<Vec<Task>>;

    async fn tasks_by_phase(
        &self,
        project_id: &str,
        phase: crate::types::Phase,
    ) -> Result<Vec<Task>>;

    async fn upsert_goal(&self, goal: Goal) -> Result<Uuid>;

    async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>>;

    // ---- Graph store (spec §4.1) ----

    async fn upsert_entity(&self, entity: Entity) -> Result<Uuid>;

    async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>>;

    async fn find_entity(
        &self,
        project_id: &str,
        name: &str,
        entity_type: &str,
    ) -> Result<Option<Entity>>;

    /// Strengthens `strength` by a decaying moving average on re-insert
    /// (spec §4.1 `upsert_relation`).
    async fn upsert_relation(&self, relation: Relation) -> Result<Uuid>;

    async fn add_observation(&self, observation: Observation) -> Result<Uuid>;

    async fn neighbours(
        &self,
        entity_id: Uuid,
        depth: usize,
        edge_filter: Option<&str>,
    ) -> Result<Vec<Entity>>;

    async fn shortest_path(
        &self,
        from: Uuid,
        to: Uuid,
        max_hops: usize,
    ) -> Result<Option<Vec<Uuid>>>;

    async fn all_relations(&self, project_id: &str) -> Result<Vec<Relation>>;

    // ---- Cursors (spec §3 `Cursor`) ----

    async fn get_cursor(&self, source_id: &str) -> Result<Option<Cursor>>;

    async fn put_cursor(&self, cursor: Cursor) -> Result<()>;
}

pub mod hash;
