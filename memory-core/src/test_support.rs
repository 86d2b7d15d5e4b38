//! Minimal fakes shared by unit tests across modules. Not part of the
//! public API; gated to `#[cfg(test)]` builds only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{EventFilter, MemoryFilter, StorageBackend};
use crate::types::{
    Cursor, Entity, Event, Goal, LifecycleStatus, Memory, Observation, Phase, Procedure,
    ProcedureExecution, Relation, Task,
};

/// A [`StorageBackend`] that holds nothing and answers every read with an
/// empty result; used where a test needs a concrete backend but never
/// expects it to be consulted.
pub struct NullStorage;

#[async_trait]
impl StorageBackend for NullStorage {
    async fn append_event(&self, event: Event) -> Result<(Uuid, bool)> {
        Ok((event.id, false))
    }
    async fn get_event(&self, _: &str, _: Uuid) -> Result<Option<Event>> {
        Ok(None)
    }
    async fn get_range(&self, _: &str, _: DateTime<Utc>, _: DateTime<Utc>, _: &EventFilter) -> Result<Vec<Event>> {
        Ok(vec![])
    }
    async fn get_by_session(&self, _: &str, _: &str) -> Result<Vec<Event>> {
        Ok(vec![])
    }
    async fn update_lifecycle(&self, _: Uuid, _: LifecycleStatus, _: f64) -> Result<()> {
        Ok(())
    }
    async fn increment_activation(&self, _: Uuid, _: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
    async fn archive_eligible(&self, _: &str, _: i64, _: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(vec![])
    }
    async fn upsert_memory(&self, memory: Memory) -> Result<Uuid> {
        Ok(memory.id)
    }
    async fn get_memory(&self, _: Uuid) -> Result<Option<Memory>> {
        Ok(None)
    }
    async fn list_memories(&self, _: &str, _: &MemoryFilter, _: usize) -> Result<Vec<Memory>> {
        Ok(vec![])
    }
    async fn semantic_search(&self, _: &str, _: &[f32], _: usize) -> Result<Vec<(Memory, f64)>> {
        Ok(vec![])
    }
    async fn lexical_search(&self, _: &str, _: &str, _: usize) -> Result<Vec<(Memory, f64)>> {
        Ok(vec![])
    }
    async fn touch_memory_access(&self, _: Uuid, _: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
    async fn update_memory_usefulness(&self, _: Uuid, _: f64) -> Result<()> {
        Ok(())
    }
    async fn upsert_procedure(&self, procedure: Procedure) -> Result<Uuid> {
        Ok(procedure.id)
    }
    async fn get_procedure(&self, _: Uuid) -> Result<Option<Procedure>> {
        Ok(None)
    }
    async fn get_procedure_by_name(&self, _: &str, _: &str) -> Result<Option<Procedure>> {
        Ok(None)
    }
    async fn list_procedures(&self, _: &str, _: usize) -> Result<Vec<Procedure>> {
        Ok(vec![])
    }
    async fn record_execution(&self, execution: ProcedureExecution) -> Result<Uuid> {
        Ok(execution.id)
    }
    async fn upsert_task(&self, task: Task) -> Result<Uuid> {
        Ok(task.id)
    }
    async fn get_task(&self, _: Uuid) -> Result<Option<Task>> {
        Ok(None)
    }
    async fn pending_tasks(&self, _: &str) -> Result<Vec<Task>> {
        Ok(vec![])
    }
    async fn tasks_by_goal(&self, _: Uuid) -> Result<Vec<Task>> {
        Ok(vec![])
    }
    async fn blocking_tasks(&self, _: &str) -> Result<Vec<Task>> {
        Ok(vec![])
    }
    async fn overdue_tasks(&self, _: &str, _: DateTime<Utc>) -> Result<Vec<Task>> {
        Ok(vec![])
    }
    async fn tasks_by_phase(&self, _: &str, _: Phase) -> Result<Vec<Task>> {
        Ok(vec![])
    }
    async fn upsert_goal(&self, goal: Goal) -> Result<Uuid> {
        Ok(goal.id)
    }
    async fn get_goal(&self, _: Uuid) -> Result<Option<Goal>> {
        Ok(None)
    }
    async fn upsert_entity(&self, entity: Entity) -> Result<Uuid> {
        Ok(entity.id)
    }
    async fn get_entity(&self, _: Uuid) -> Result<Option<Entity>> {
        Ok(None)
    }
    async fn find_entity(&self, _: &str, _: &str, _: &str) -> Result<Option<Entity>> {
        Ok(None)
    }
    async fn upsert_relation(&self, relation: Relation) -> Result<Uuid> {
        Ok(relation.id)
    }
    async fn add_observation(&self, observation: Observation) -> Result<Uuid> {
        Ok(observation.id)
    }
    async fn neighbours(&self, _: Uuid, _: usize, _: Option<&str>) -> Result<Vec<Entity>> {
        Ok(vec![])
    }
    async fn shortest_path(&self, _: Uuid, _: Uuid, _: usize) -> Result<Option<Vec<Uuid>>> {
        Ok(None)
    }
    async fn all_relations(&self, _: &str) -> Result<Vec<Relation>> {
        Ok(vec![])
    }
    async fn get_cursor(&self, _: &str) -> Result<Option<Cursor>> {
        Ok(None)
    }
    async fn put_cursor(&self, _: Cursor) -> Result<()> {
        Ok(())
    }
}
