//! Enumerations shared by the data model (spec §3).

use serde::{Deserialize, Serialize};

/// The kind of episodic event recorded (spec §3 `Event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Action,
    Observation,
    Decision,
    Error,
    Success,
    Conversation,
}

/// Outcome recorded on an event (spec §3 `Event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
    Ongoing,
    #[default]
    None,
}

/// Event lifecycle state (spec §3 `Event`, §8 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Active,
    Consolidated,
    Archived,
}

/// Memory kind (spec §3 `Memory`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Fact,
    Pattern,
    Decision,
    Context,
    Principle,
}

/// Task priority (spec §3 `Task`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Task status (spec §3 `Task`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
    Blocked,
}

/// Task phase; transitions are forward-only except via explicit replan
/// (spec §3 `Task` invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Planning,
    PlanReady,
    Executing,
    Verifying,
    Completed,
}

impl Phase {
    /// Ordinal used to enforce forward-only transitions.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Phase::Planning => 0,
            Phase::PlanReady => 1,
            Phase::Executing => 2,
            Phase::Verifying => 3,
            Phase::Completed => 4,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    #[must_use]
    pub fn can_advance_to(self, next: Phase) -> bool {
        next.ordinal() >= self.ordinal()
    }
}

/// Router query classification (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Temporal,
    Factual,
    Relational,
    Procedural,
    Prospective,
    Meta,
    Planning,
}

/// Discrete confidence band derived from `confidence.overall` (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Bucket a `[0,1]` overall confidence score into a level.
    #[must_use]
    pub fn from_overall(overall: f64) -> Self {
        match overall {
            x if x < 0.2 => ConfidenceLevel::VeryLow,
            x if x < 0.4 => ConfidenceLevel::Low,
            x if x < 0.6 => ConfidenceLevel::Medium,
            x if x < 0.8 => ConfidenceLevel::High,
            _ => ConfidenceLevel::VeryHigh,
        }
    }
}

/// Consolidation strategy (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationStrategy {
    Minimal,
    Speed,
    #[default]
    Balanced,
    Quality,
}

/// Eviction policy for capacity-constrained event log storage, generalised
/// from the teacher's `episodic::capacity::EvictionPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    Lru,
    #[default]
    RelevanceWeighted,
}

/// Status of a speculative dream-generated variant (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DreamStatus {
    #[default]
    PendingEvaluation,
    Evaluated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_forward_only() {
        assert!(Phase::Planning.can_advance_to(Phase::Executing));
        assert!(!Phase::Executing.can_advance_to(Phase::Planning));
        assert!(Phase::Executing.can_advance_to(Phase::Executing));
    }

    #[test]
    fn confidence_level_buckets() {
        assert_eq!(ConfidenceLevel::from_overall(0.05), ConfidenceLevel::VeryLow);
        assert_eq!(ConfidenceLevel::from_overall(0.95), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_overall(0.5), ConfidenceLevel::Medium);
    }
}
