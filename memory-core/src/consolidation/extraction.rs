//! Pattern extraction strategies run against a System 1 cluster (spec §4.2
//! step 3). Each strategy looks at a cluster from a different angle and may
//! decline to produce a candidate.

use uuid::Uuid;

use crate::types::{Event, MemoryType, Outcome};

use super::clustering::cluster_cohesion;

/// A draft memory/procedure pulled out of a cluster, not yet validated.
#[derive(Debug, Clone)]
pub struct PatternCandidate {
    pub content: String,
    pub memory_type: MemoryType,
    pub is_procedural: bool,
    pub support_count: usize,
    pub cohesion: f64,
    pub outcome_variance: f64,
    pub uncertainty: f64,
    pub source_event_ids: Vec<Uuid>,
}

fn outcome_numeric(outcome: Outcome) -> Option<f64> {
    match outcome {
        Outcome::Success => Some(1.0),
        Outcome::Failure => Some(0.0),
        Outcome::Partial => Some(0.5),
        Outcome::Ongoing | Outcome::None => None,
    }
}

fn outcome_variance(events: &[&Event]) -> f64 {
    let values: Vec<f64> = events.iter().filter_map(|e| outcome_numeric(e.outcome)).collect();
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Uncertainty combines cluster cohesion, support size, and outcome
/// consistency: tight, well-supported, outcome-consistent clusters are
/// confidently consolidatable without System 2 review (spec §4.2 step 3).
fn uncertainty(cohesion: f64, support_count: usize, variance: f64) -> f64 {
    let support_term = (support_count as f64 / 10.0).min(0.3);
    let raw = 1.0 - cohesion.clamp(0.0, 1.0) * 0.6 - support_term + variance * 0.4;
    raw.clamp(0.0, 1.0)
}

/// A named strategy that inspects a cluster and may propose a candidate.
pub trait PatternExtractorStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, cluster_events: &[&Event], half_life_min: f64) -> Option<PatternCandidate>;
}

fn base_candidate(
    content: String,
    memory_type: MemoryType,
    is_procedural: bool,
    cluster_events: &[&Event],
    half_life_min: f64,
) -> PatternCandidate {
    let cohesion = cluster_cohesion(cluster_events, half_life_min);
    let variance = outcome_variance(cluster_events);
    let support_count = cluster_events.len();
    PatternCandidate {
        content,
        memory_type,
        is_procedural,
        support_count,
        cohesion,
        outcome_variance: variance,
        uncertainty: uncertainty(cohesion, support_count, variance),
        source_event_ids: cluster_events.iter().map(|e| e.id).collect(),
    }
}

/// Looks for a cluster dominated by `EventType::Action` events sharing a
/// content prefix, suggesting a repeatable tool sequence (spec §4.2,
/// "procedures are ... repeated tool-call sequences").
pub struct ToolSequenceExtractor;

impl PatternExtractorStrategy for ToolSequenceExtractor {
    fn name(&self) -> &'static str {
        "tool_sequence"
    }

    fn extract(&self, cluster_events: &[&Event], half_life_min: f64) -> Option<PatternCandidate> {
        if cluster_events.len() < 3 {
            return None;
        }
        let actions = cluster_events
            .iter()
            .filter(|e| e.event_type == crate::types::EventType::Action)
            .count();
        if actions * 3 < cluster_events.len() * 2 {
            return None;
        }
        let steps: Vec<&str> = cluster_events.iter().map(|e| e.content.as_str()).collect();
        let content = format!("Repeated sequence: {}", steps.join(" -> "));
        Some(base_candidate(content, MemoryType::Pattern, true, cluster_events, half_life_min))
    }
}

/// Looks for a cluster that contains at least one failure followed by a
/// later success in the same session, suggesting a recovery strategy worth
/// remembering (spec §4.2, pattern categories include error recovery).
pub struct ErrorRecoveryExtractor;

impl PatternExtractorStrategy for ErrorRecoveryExtractor {
    fn name(&self) -> &'static str {
        "error_recovery"
    }

    fn extract(&self, cluster_events: &[&Event], half_life_min: f64) -> Option<PatternCandidate> {
        let mut sorted = cluster_events.to_vec();
        sorted.sort_by_key(|e| e.timestamp);
        let first_failure = sorted.iter().position(|e| e.outcome == Outcome::Failure)?;
        let recovered = sorted[first_failure..]
            .iter()
            .any(|e| e.outcome == Outcome::Success);
        if !recovered {
            return None;
        }
        let failure = sorted[first_failure];
        let recovery_step = sorted[first_failure..]
            .iter()
            .find(|e| e.outcome == Outcome::Success)?;
        let content = format!(
            "After failure '{}', recovery succeeded via '{}'",
            failure.content, recovery_step.content
        );
        Some(base_candidate(content, MemoryType::Pattern, false, cluster_events, half_life_min))
    }
}

/// Looks for a cluster sharing a common `context.task` or `context.cwd`,
/// suggesting a reusable contextual fact about the project (spec §4.2,
/// pattern categories include contextual facts).
pub struct ContextPatternExtractor;

impl PatternExtractorStrategy for ContextPatternExtractor {
    fn name(&self) -> &'static str {
        "context_pattern"
    }

    fn extract(&self, cluster_events: &[&Event], half_life_min: f64) -> Option<PatternCandidate> {
        if cluster_events.len() < 2 {
            return None;
        }
        let first_task = cluster_events[0].context.task.as_deref();
        let shared_task = first_task.filter(|task| {
            cluster_events
                .iter()
                .all(|e| e.context.task.as_deref() == Some(task))
        });
        let shared = shared_task?;
        let learned: Vec<&str> = cluster_events.iter().filter_map(|e| e.learned.as_deref()).collect();
        if learned.is_empty() {
            return None;
        }
        let content = format!("Working on '{shared}': {}", learned.join("; "));
        Some(base_candidate(content, MemoryType::Context, false, cluster_events, half_life_min))
    }
}

/// The default set of extractor strategies (spec §4.2 supplemental
/// categories: tool sequences, error recovery, context patterns).
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn PatternExtractorStrategy>> {
    vec![
        Box::new(ToolSequenceExtractor),
        Box::new(ErrorRecoveryExtractor),
        Box::new(ContextPatternExtractor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventContext, EventType};
    use chrono::Utc;

    fn action_event(content: &str, outcome: Outcome, offset_s: i64) -> Event {
        let now = Utc::now() + chrono::Duration::seconds(offset_s);
        Event::new("p", "s1", EventType::Action, content, outcome, EventContext::default(), now)
    }

    #[test]
    fn tool_sequence_needs_majority_action_events() {
        let events = vec![
            action_event("grep", Outcome::Success, 0),
            action_event("edit", Outcome::Success, 1),
            action_event("test", Outcome::Success, 2),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        let candidate = ToolSequenceExtractor.extract(&refs, 30.0);
        assert!(candidate.is_some());
    }

    #[test]
    fn error_recovery_requires_failure_then_success() {
        let events = vec![
            action_event("run tests", Outcome::Failure, 0),
            action_event("fix import", Outcome::Success, 60),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        assert!(ErrorRecoveryExtractor.extract(&refs, 30.0).is_some());
    }

    #[test]
    fn error_recovery_declines_without_success() {
        let events = vec![
            action_event("run tests", Outcome::Failure, 0),
            action_event("run tests again", Outcome::Failure, 60),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        assert!(ErrorRecoveryExtractor.extract(&refs, 30.0).is_none());
    }

    #[test]
    fn uncertainty_is_low_for_tight_consistent_cluster() {
        let u = uncertainty(0.95, 8, 0.0);
        assert!(u < 0.3);
    }

    #[test]
    fn uncertainty_is_high_for_loose_inconsistent_cluster() {
        let u = uncertainty(0.2, 2, 0.5);
        assert!(u > 0.6);
    }
}
