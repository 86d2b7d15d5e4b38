//! A stateful, in-memory [`StorageBackend`] used only by this crate's own
//! operation unit tests. Unlike `memory_core::test_support::NullStorage`
//! (which answers every read with nothing), this one actually remembers
//! what was written, so operation tests can assert on round trips without
//! pulling in `memory-storage`'s `redb` backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use memory_core::error::Result;
use memory_core::storage::{EventFilter, MemoryFilter, StorageBackend};
use memory_core::types::{
    Cursor, Entity, Event, Goal, LifecycleStatus, Memory, Observation, Phase, Procedure,
    ProcedureExecution, Relation, Task,
};

#[derive(Default)]
pub struct FakeStorage {
    events: Mutex<Vec<Event>>,
    memories: Mutex<Vec<Memory>>,
    procedures: Mutex<Vec<Procedure>>,
    executions: Mutex<Vec<ProcedureExecution>>,
    tasks: Mutex<Vec<Task>>,
    goals: Mutex<Vec<Goal>>,
    entities: Mutex<Vec<Entity>>,
    relations: Mutex<Vec<Relation>>,
    observations: Mutex<Vec<Observation>>,
    cursors: Mutex<HashMap<String, Cursor>>,
}

#[async_trait]
impl StorageBackend for FakeStorage {
    async fn append_event(&self, event: Event) -> Result<(Uuid, bool)> {
        let mut events = self.events.lock();
        if let Some(existing) = events.iter().find(|e| e.project_id == event.project_id && e.hash == event.hash && !event.hash.is_empty()) {
            return Ok((existing.id, true));
        }
        let id = event.id;
        events.push(event);
        Ok((id, false))
    }

    async fn get_event(&self, project_id: &str, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.lock().iter().find(|e| e.project_id == project_id && e.id == id).cloned())
    }

    async fn get_range(&self, project_id: &str, from: DateTime<Utc>, to: DateTime<Utc>, filter: &EventFilter) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.project_id == project_id)
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .filter(|e| filter.session_id.as_deref().is_none_or(|s| s == e.session_id))
            .filter(|e| filter.lifecycle_status.is_none_or(|s| s == e.lifecycle_status))
            .cloned()
            .collect())
    }

    async fn get_by_session(&self, project_id: &str, session_id: &str) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.project_id == project_id && e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn update_lifecycle(&self, id: Uuid, status: LifecycleStatus, consolidation_score: f64) -> Result<()> {
        if let Some(e) = self.events.lock().iter_mut().find(|e| e.id == id) {
            e.lifecycle_status = status;
            e.consolidation_score = consolidation_score;
        }
        Ok(())
    }

    async fn increment_activation(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(e) = self.events.lock().iter_mut().find(|e| e.id == id) {
            e.last_activation = at;
            e.activation_count += 1;
        }
        Ok(())
    }

    async fn archive_eligible(&self, project_id: &str, retention_days: i64, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.project_id == project_id)
            .filter(|e| e.lifecycle_status == LifecycleStatus::Consolidated)
            .filter(|e| (now - e.last_activation).num_days() > retention_days)
            .map(|e| e.id)
            .collect())
    }

    async fn upsert_memory(&self, memory: Memory) -> Result<Uuid> {
        let mut memories = self.memories.lock();
        let id = memory.id;
        if let Some(existing) = memories.iter_mut().find(|m| m.id == id) {
            *existing = memory;
        } else {
            memories.push(memory);
        }
        Ok(id)
    }

    async fn get_memory(&self, id: Uuid) -> Result<Option<Memory>> {
        Ok(self.memories.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn list_memories(&self, project_id: &str, filter: &MemoryFilter, limit: usize) -> Result<Vec<Memory>> {
        Ok(self
            .memories
            .lock()
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter(|m| filter.memory_type.is_none_or(|t| t == m.memory_type))
            .filter(|m| filter.tag.as_ref().is_none_or(|t| m.tags.contains(t)))
            .filter(|m| filter.domain.as_ref().is_none_or(|d| m.domains.contains(d)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn semantic_search(&self, project_id: &str, query_embedding: &[f32], k: usize) -> Result<Vec<(Memory, f64)>> {
        let mut scored: Vec<(Memory, f64)> = self
            .memories
            .lock()
            .iter()
            .filter(|m| m.project_id == project_id && m.embedding.len() == query_embedding.len())
            .map(|m| {
                let dot: f32 = m.embedding.iter().zip(query_embedding).map(|(a, b)| a * b).sum();
                (m.clone(), f64::from(dot))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn lexical_search(&self, project_id: &str, query_text: &str, k: usize) -> Result<Vec<(Memory, f64)>> {
        let needle = query_text.to_lowercase();
        let tokens: Vec<&str> = needle.split_whitespace().collect();
        let mut scored: Vec<(Memory, f64)> = self
            .memories
            .lock()
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                let hay = m.content.to_lowercase();
                let hits = tokens.iter().filter(|t| hay.contains(*t)).count();
                (hits > 0).then(|| (m.clone(), hits as f64))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn touch_memory_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(m) = self.memories.lock().iter_mut().find(|m| m.id == id) {
            m.last_accessed = at;
            m.access_count += 1;
        }
        Ok(())
    }

    async fn update_memory_usefulness(&self, id: Uuid, usefulness_score: f64) -> Result<()> {
        if let Some(m) = self.memories.lock().iter_mut().find(|m| m.id == id) {
            m.usefulness_score = usefulness_score;
        }
        Ok(())
    }

    async fn upsert_procedure(&self, procedure: Procedure) -> Result<Uuid> {
        let mut procedures = self.procedures.lock();
        let id = procedure.id;
        if let Some(existing) = procedures.iter_mut().find(|p| p.id == id) {
            *existing = procedure;
        } else {
            procedures.push(procedure);
        }
        Ok(id)
    }

    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>> {
        Ok(self.procedures.lock().iter().find(|p| p.id == id).cloned())
    }

    async fn get_procedure_by_name(&self, project_id: &str, name: &str) -> Result<Option<Procedure>> {
        Ok(self.procedures.lock().iter().find(|p| p.project_id == project_id && p.name == name).cloned())
    }

    async fn list_procedures(&self, project_id: &str, limit: usize) -> Result<Vec<Procedure>> {
        Ok(self.procedures.lock().iter().filter(|p| p.project_id == project_id).take(limit).cloned().collect())
    }

    async fn record_execution(&self, execution: ProcedureExecution) -> Result<Uuid> {
        let id = execution.id;
        self.executions.lock().push(execution);
        Ok(id)
    }

    async fn upsert_task(&self, task: Task) -> Result<Uuid> {
        let mut tasks = self.tasks.lock();
        let id = task.id;
        if let Some(existing) = tasks.iter_mut().find(|t| t.id == id) {
            *existing = task;
        } else {
            tasks.push(task);
        }
        Ok(id)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.lock().iter().find(|t| t.id == id).cloned())
    }

    async fn pending_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.project_id == project_id && t.status == memory_core::types::TaskStatus::Pending)
            .cloned()
            .collect())
    }

    async fn tasks_by_goal(&self, goal_id: Uuid) -> Result<Vec<Task>> {
        Ok(self.tasks.lock().iter().filter(|t| t.goal_id == Some(goal_id)).cloned().collect())
    }

    async fn blocking_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.project_id == project_id && t.status == memory_core::types::TaskStatus::Blocked)
            .cloned()
            .collect())
    }

    async fn overdue_tasks(&self, project_id: &str, now: DateTime<Utc>) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.project_id == project_id)
            .filter(|t| memory_core::prospective::is_overdue(t, now))
            .cloned()
            .collect())
    }

    async fn tasks_by_phase(&self, project_id: &str, phase: Phase) -> Result<Vec<Task>> {
        Ok(self.tasks.lock().iter().filter(|t| t.project_id == project_id && t.phase == phase).cloned().collect())
    }

    async fn upsert_goal(&self, goal: Goal) -> Result<Uuid> {
        let mut goals = self.goals.lock();
        let id = goal.id;
        if let Some(existing) = goals.iter_mut().find(|g| g.id == id) {
            *existing = goal;
        } else {
            goals.push(goal);
        }
        Ok(id)
    }

    async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>> {
        Ok(self.goals.lock().iter().find(|g| g.id == id).cloned())
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Uuid> {
        let mut entities = self.entities.lock();
        let id = entity.id;
        if let Some(existing) = entities.iter_mut().find(|e| e.id == id) {
            *existing = entity;
        } else {
            entities.push(entity);
        }
        Ok(id)
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>> {
        Ok(self.entities.lock().iter().find(|e| e.id == id).cloned())
    }

    async fn find_entity(&self, project_id: &str, name: &str, entity_type: &str) -> Result<Option<Entity>> {
        Ok(self
            .entities
            .lock()
            .iter()
            .find(|e| e.project_id == project_id && e.name == name && e.entity_type == entity_type)
            .cloned())
    }

    async fn upsert_relation(&self, relation: Relation) -> Result<Uuid> {
        let mut relations = self.relations.lock();
        if let Some(existing) = relations
            .iter_mut()
            .find(|r| r.from_entity == relation.from_entity && r.to_entity == relation.to_entity && r.relation_type == relation.relation_type)
        {
            existing.strength = memory_core::graph::decay_moving_average(existing.strength, relation.strength, 0.7);
            return Ok(existing.id);
        }
        let id = relation.id;
        relations.push(relation);
        Ok(id)
    }

    async fn add_observation(&self, observation: Observation) -> Result<Uuid> {
        let id = observation.id;
        self.observations.lock().push(observation);
        Ok(id)
    }

    async fn neighbours(&self, entity_id: Uuid, depth: usize, edge_filter: Option<&str>) -> Result<Vec<Entity>> {
        let relations = self.relations.lock().clone();
        let entities = self.entities.lock().clone();
        let mut frontier = vec![entity_id];
        let mut seen = std::collections::HashSet::new();
        seen.insert(entity_id);
        for _ in 0..depth.max(1) {
            let mut next = Vec::new();
            for &node in &frontier {
                for rel in &relations {
                    if edge_filter.is_some_and(|f| f != rel.relation_type) {
                        continue;
                    }
                    let other = if rel.from_entity == node {
                        Some(rel.to_entity)
                    } else if rel.to_entity == node {
                        Some(rel.from_entity)
                    } else {
                        None
                    };
                    if let Some(other) = other {
                        if seen.insert(other) {
                            next.push(other);
                        }
                    }
                }
            }
            frontier = next;
        }
        seen.remove(&entity_id);
        Ok(entities.into_iter().filter(|e| seen.contains(&e.id)).collect())
    }

    async fn shortest_path(&self, from: Uuid, to: Uuid, max_hops: usize) -> Result<Option<Vec<Uuid>>> {
        if from == to {
            return Ok(Some(vec![from]));
        }
        let relations = self.relations.lock().clone();
        let mut frontier = std::collections::VecDeque::new();
        frontier.push_back(vec![from]);
        let mut seen = std::collections::HashSet::new();
        seen.insert(from);
        while let Some(path) = frontier.pop_front() {
            let node = *path.last().expect("path is never empty");
            if path.len() - 1 >= max_hops {
                continue;
            }
            for rel in &relations {
                let other = if rel.from_entity == node {
                    Some(rel.to_entity)
                } else if rel.to_entity == node {
                    Some(rel.from_entity)
                } else {
                    None
                };
                if let Some(other) = other {
                    if other == to {
                        let mut full = path.clone();
                        full.push(other);
                        return Ok(Some(full));
                    }
                    if seen.insert(other) {
                        let mut next = path.clone();
                        next.push(other);
                        frontier.push_back(next);
                    }
                }
            }
        }
        Ok(None)
    }

    async fn all_relations(&self, project_id: &str) -> Result<Vec<Relation>> {
        Ok(self.relations.lock().iter().filter(|r| r.project_id == project_id).cloned().collect())
    }

    async fn get_cursor(&self, source_id: &str) -> Result<Option<Cursor>> {
        Ok(self.cursors.lock().get(source_id).cloned())
    }

    async fn put_cursor(&self, cursor: Cursor) -> Result<()> {
        self.cursors.lock().insert(cursor.source_id.clone(), cursor);
        Ok(())
    }
}
