//! Core entity types (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{
    ConfidenceLevel, DreamStatus, EventType, LifecycleStatus, MemoryType, Outcome, Phase,
    Priority, TaskStatus,
};

/// Free-form execution context attached to an event (spec §3 `Event.context`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub task: Option<String>,
    pub phase: Option<Phase>,
    pub cwd: Option<String>,
    pub files: Vec<String>,
}

/// A timestamped record of something that happened in a session (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub project_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub content: String,
    pub outcome: Outcome,
    pub context: EventContext,
    pub learned: Option<String>,
    pub importance_score: f64,
    pub confidence: f64,
    pub duration_ms: Option<u64>,
    pub hash: String,
    pub lifecycle_status: LifecycleStatus,
    pub consolidation_score: f64,
    pub last_activation: DateTime<Utc>,
    pub activation_count: u64,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Construct a new active event; `hash` is computed by the caller
    /// (storage layer) over the canonical fields (spec §4.1).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_id: impl Into<String>,
        session_id: impl Into<String>,
        event_type: EventType,
        content: impl Into<String>,
        outcome: Outcome,
        context: EventContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            session_id: session_id.into(),
            timestamp: now,
            event_type,
            content: content.into(),
            outcome,
            context,
            learned: None,
            importance_score: 0.5,
            confidence: 0.5,
            duration_ms: None,
            hash: String::new(),
            lifecycle_status: LifecycleStatus::Active,
            consolidation_score: 0.0,
            last_activation: now,
            activation_count: 0,
            embedding: None,
            created_at: now,
        }
    }
}

/// A distilled, reusable piece of knowledge (spec §3 `Memory`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub project_id: String,
    pub content: String,
    pub memory_type: MemoryType,
    pub tags: Vec<String>,
    pub domains: Vec<String>,
    pub importance: f64,
    pub quality: f64,
    pub usefulness_score: f64,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
    pub source_event_ids: Vec<Uuid>,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// A parameter declared by a [`Procedure`] template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureParam {
    pub name: String,
    pub param_type: String,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

/// A reusable templated workflow with tracked success rate (spec §3 `Procedure`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    pub category: String,
    pub template: String,
    pub params: Vec<ProcedureParam>,
    pub success_rate: f64,
    pub usage_count: u64,
    pub avg_duration_ms: f64,
    pub trigger_pattern: Option<String>,
    pub examples: Vec<String>,
    pub source_event_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one execution of a [`Procedure`] (spec §3 `ProcedureExecution`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureExecution {
    pub id: Uuid,
    pub procedure_id: Uuid,
    pub project_id: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub learned: Option<String>,
    pub variables: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// A prospective unit of work (spec §3 `Task`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: String,
    pub content: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub phase: Phase,
    pub assignee: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub triggers: Vec<String>,
    pub goal_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A prospective goal, aggregating tasks (spec §3 `Goal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub progress: u8,
    pub task_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A node in the knowledge graph (spec §3 `Entity`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    pub entity_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A directed, weighted edge between two entities (spec §3 `Relation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub id: Uuid,
    pub project_id: String,
    pub from_entity: Uuid,
    pub to_entity: Uuid,
    pub relation_type: String,
    pub strength: f64,
    pub confidence: f64,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A timestamped fact attached to an [`Entity`] (spec §3 `Observation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    pub superseded_by: Option<Uuid>,
}

/// One slot in the working-memory buffer (spec §3 `Working-memory slot`, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemorySlot {
    pub item_ref: ItemRef,
    pub salience: f64,
    pub inserted_at: DateTime<Utc>,
    pub last_reinforced: DateTime<Utc>,
}

/// A weak cross-layer reference `(layer, id)` (spec §3 ownership section,
/// §9 redesign flag on cyclic graphs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub layer: Layer,
    pub id: Uuid,
}

/// The storage layer an [`ItemRef`] points into (spec §4.6 namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Episodic,
    Semantic,
    Procedural,
    Prospective,
    Graph,
}

/// The active task/phase and recent events bound to a session id (spec §3/§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub project_id: String,
    pub task: Option<String>,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub recent_events: std::collections::VecDeque<Uuid>,
    pub consolidation_history: Vec<Uuid>,
    pub ring_capacity: usize,
}

impl SessionContext {
    /// Append an event id to the bounded recent-events ring (spec §4.4).
    pub fn push_event(&mut self, event_id: Uuid) {
        self.recent_events.push_back(event_id);
        while self.recent_events.len() > self.ring_capacity {
            self.recent_events.pop_front();
        }
    }
}

/// An opaque ingestion cursor for an out-of-core external source (spec §3 `Cursor`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor {
    pub source_id: String,
    pub cursor_data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// A speculative consolidation variant awaiting LLM evaluation (spec §4.2 dream generation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DreamVariant {
    pub id: Uuid,
    pub project_id: String,
    pub source_memory_id: Option<Uuid>,
    pub content: String,
    pub status: DreamStatus,
    pub tier: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// The full breakdown behind a recall result's confidence (spec §4.3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    pub semantic_relevance: f64,
    pub source_quality: f64,
    pub recency: f64,
    pub consistency: f64,
    pub completeness: f64,
    pub overall: f64,
    pub level: ConfidenceLevel,
}

impl Confidence {
    /// Compute `overall` from the weighted components (spec §4.3) and
    /// derive the discrete [`ConfidenceLevel`].
    #[must_use]
    pub fn compute(
        semantic_relevance: f64,
        source_quality: f64,
        recency: f64,
        consistency: f64,
        completeness: f64,
    ) -> Self {
        let overall = 0.35 * semantic_relevance
            + 0.25 * source_quality
            + 0.15 * recency
            + 0.15 * consistency
            + 0.10 * completeness;
        Self {
            semantic_relevance,
            source_quality,
            recency,
            consistency,
            completeness,
            overall,
            level: ConfidenceLevel::from_overall(overall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ring_is_bounded() {
        let mut ctx = SessionContext {
            session_id: "s1".into(),
            project_id: "p1".into(),
            task: None,
            phase: Phase::default(),
            started_at: Utc::now(),
            ended_at: None,
            recent_events: std::collections::VecDeque::new(),
            consolidation_history: vec![],
            ring_capacity: 3,
        };
        for _ in 0..5 {
            ctx.push_event(Uuid::new_v4());
        }
        assert_eq!(ctx.recent_events.len(), 3);
    }

    #[test]
    fn confidence_overall_matches_weighted_formula() {
        let c = Confidence::compute(1.0, 1.0, 1.0, 1.0, 1.0);
        assert!((c.overall - 1.0).abs() < 1e-9);
        assert_eq!(c.level, ConfidenceLevel::VeryHigh);
    }
}
