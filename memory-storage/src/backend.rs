//! `StorageBackend` for [`RedbStorage`]: each method delegates to the
//! `*_impl` defined in the matching domain module (SPEC_FULL §4.1, grounded
//! in the teacher's thin `storage_ops.rs` delegation layer).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use memory_core::storage::{EventFilter, MemoryFilter, StorageBackend};
use memory_core::types::{
    Cursor, Entity, Event, Goal, LifecycleStatus, Memory, Observation, Phase, Procedure,
    ProcedureExecution, Relation, Task,
};
use memory_core::Result;

use crate::RedbStorage;

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn append_event(&self, event: Event) -> Result<(Uuid, bool)> {
        self.append_event_impl(event).await
    }

    async fn get_event(&self, project_id: &str, id: Uuid) -> Result<Option<Event>> {
        self.get_event_impl(project_id, id).await
    }

    async fn get_range(
        &self,
        project_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &EventFilter,
    ) -> Result<Vec<Event>> {
        self.get_range_impl(project_id, from, to, filter).await
    }

    async fn get_by_session(&self, project_id: &str, session_id: &str) -> Result<Vec<Event>> {
        self.get_by_session_impl(project_id, session_id).await
    }

    async fn update_lifecycle(&self, id: Uuid, status: LifecycleStatus, consolidation_score: f64) -> Result<()> {
        self.update_lifecycle_impl(id, status, consolidation_score).await
    }

    async fn increment_activation(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.increment_activation_impl(id, at).await
    }

    async fn archive_eligible(&self, project_id: &str, retention_days: i64, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        self.archive_eligible_impl(project_id, retention_days, now).await
    }

    async fn upsert_memory(&self, memory: Memory) -> Result<Uuid> {
        self.upsert_memory_impl(memory).await
    }

    async fn get_memory(&self, id: Uuid) -> Result<Option<Memory>> {
        self.get_memory_impl(id).await
    }

    async fn list_memories(&self, project_id: &str, filter: &MemoryFilter, limit: usize) -> Result<Vec<Memory>> {
        self.list_memories_impl(project_id, filter, limit).await
    }

    async fn semantic_search(&self, project_id: &str, query_embedding: &[f32], k: usize) -> Result<Vec<(Memory, f64)>> {
        self.semantic_search_impl(project_id, query_embedding, k).await
    }

    async fn lexical_search(&self, project_id: &str, query_text: &str, k: usize) -> Result<Vec<(Memory, f64)>> {
        self.lexical_search_impl(project_id, query_text, k).await
    }

    async fn touch_memory_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.touch_memory_access_impl(id, at).await
    }

    async fn update_memory_usefulness(&self, id: Uuid, usefulness_score: f64) -> Result<()> {
        self.update_memory_usefulness_impl(id, usefulness_score).await
    }

    async fn upsert_procedure(&self, procedure: Procedure) -> Result<Uuid> {
        self.upsert_procedure_impl(procedure).await
    }

    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>> {
        self.get_procedure_impl(id).await
    }

    async fn get_procedure_by_name(&self, project_id: &str, name: &str) -> Result<Option<Procedure>> {
        self.get_procedure_by_name_impl(project_id, name).await
    }

    async fn list_procedures(&self, project_id: &str, limit: usize) -> Result<Vec<Procedure>> {
        self.list_procedures_impl(project_id, limit).await
    }

    async fn record_execution(&self, execution: ProcedureExecution) -> Result<Uuid> {
        self.record_execution_impl(execution).await
    }

    async fn upsert_task(&self, task: Task) -> Result<Uuid> {
        self.upsert_task_impl(task).await
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        self.get_task_impl(id).await
    }

    async fn pending_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        self.pending_tasks_impl(project_id).await
    }

    async fn tasks_by_goal(&self, goal_id: Uuid) -> Result<Vec<Task>> {
        self.tasks_by_goal_impl(goal_id).await
    }

    async fn blocking_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        self.blocking_tasks_impl(project_id).await
    }

    async fn overdue_tasks(&self, project_id: &str, now: DateTime<Utc>) -> Result<Vec<Task>> {
        self.overdue_tasks_impl(project_id, now).await
    }

    async fn tasks_by_phase(&self, project_id: &str, phase: Phase) -> Result<Vec<Task>> {
        self.tasks_by_phase_impl(project_id, phase).await
    }

    async fn upsert_goal(&self, goal: Goal) -> Result<Uuid> {
        self.upsert_goal_impl(goal).await
    }

    async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>> {
        self.get_goal_impl(id).await
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Uuid> {
        self.upsert_entity_impl(entity).await
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>> {
        self.get_entity_impl(id).await
    }

    async fn find_entity(&self, project_id: &str, name: &str, entity_type: &str) -> Result<Option<Entity>> {
        self.find_entity_impl(project_id, name, entity_type).await
    }

    async fn upsert_relation(&self, relation: Relation) -> Result<Uuid> {
        self.upsert_relation_impl(relation).await
    }

    async fn add_observation(&self, observation: Observation) -> Result<Uuid> {
        self.add_observation_impl(observation).await
    }

    async fn neighbours(&self, entity_id: Uuid, depth: usize, edge_filter: Option<&str>) -> Result<Vec<Entity>> {
        self.neighbours_impl(entity_id, depth, edge_filter).await
    }

    async fn shortest_path(&self, from: Uuid, to: Uuid, max_hops: usize) -> Result<Option<Vec<Uuid>>> {
        self.shortest_path_impl(from, to, max_hops).await
    }

    async fn all_relations(&self, project_id: &str) -> Result<Vec<Relation>> {
        self.all_relations_impl(project_id).await
    }

    async fn get_cursor(&self, source_id: &str) -> Result<Option<Cursor>> {
        self.get_cursor_impl(source_id).await
    }

    async fn put_cursor(&self, cursor: Cursor) -> Result<()> {
        self.put_cursor_impl(cursor).await
    }
}
