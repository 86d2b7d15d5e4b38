//! Session-context lifecycle: creation, the recent-events ring, phase
//! re-classification, and auto-recovery payload synthesis (spec §4.4).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Event, Phase, SessionContext};

/// Keyword markers that trigger phase re-classification on a turn (spec
/// §4.4 "keywords indicating phase change").
const PHASE_MARKERS: &[(&str, Phase)] = &[
    ("let's plan", Phase::Planning),
    ("here's the plan", Phase::PlanReady),
    ("starting implementation", Phase::Executing),
    ("let's verify", Phase::Verifying),
    ("running tests", Phase::Verifying),
    ("all done", Phase::Completed),
];

/// Natural-language markers that indicate the user is asking to resume
/// context (spec §4.4 "auto-recovery").
const RECOVERY_MARKERS: &[&str] = &["where were we", "what was i doing", "what were we doing", "catch me up"];

/// Start a new session context (spec §4.4 "Created on session_start").
#[must_use]
pub fn start_session(project_id: &str, session_id: &str, ring_capacity: usize, now: DateTime<Utc>) -> SessionContext {
    SessionContext {
        session_id: session_id.to_string(),
        project_id: project_id.to_string(),
        task: None,
        phase: Phase::default(),
        started_at: now,
        ended_at: None,
        recent_events: std::collections::VecDeque::new(),
        consolidation_history: Vec::new(),
        ring_capacity,
    }
}

/// End a session context (spec §4.4 "ended on session_end").
pub fn end_session(ctx: &mut SessionContext, now: DateTime<Utc>) {
    ctx.ended_at = Some(now);
}

/// Append an event to the ring and, if the turn text matches a
/// re-classification marker, advance `phase` (spec §4.4 "on conversation_turn
/// or user_prompt_submit"). Re-classification only moves phase forward,
/// consistent with [`crate::prospective::transition_phase`]'s invariant.
pub fn observe_turn(ctx: &mut SessionContext, event_id: Uuid, turn_text: &str) {
    ctx.push_event(event_id);
    let lowered = turn_text.to_lowercase();
    for (marker, phase) in PHASE_MARKERS {
        if lowered.contains(marker) && ctx.phase.can_advance_to(*phase) {
            ctx.phase = *phase;
            break;
        }
    }
}

/// Whether `prompt_text` matches a recovery-request pattern.
#[must_use]
pub fn is_recovery_request(prompt_text: &str) -> bool {
    let lowered = prompt_text.to_lowercase();
    RECOVERY_MARKERS.iter().any(|m| lowered.contains(m))
}

/// A synthesised "what was I doing" payload built from the session ring and
/// the most recent events (spec §4.4 "auto-recovery").
#[derive(Debug, Clone)]
pub struct RecoveryPayload {
    pub task: Option<String>,
    pub phase: Phase,
    pub recent_summaries: Vec<String>,
}

/// Build a recovery payload from the session ring, given the already
/// fetched events it refers to (spec §4.4 "synthesises ... from the session
/// ring and the top-k recent events").
#[must_use]
pub fn synthesize_recovery(ctx: &SessionContext, recent_events: &[Event]) -> RecoveryPayload {
    let by_id: std::collections::HashMap<Uuid, &Event> = recent_events.iter().map(|e| (e.id, e)).collect();
    let recent_summaries = ctx
        .recent_events
        .iter()
        .rev()
        .filter_map(|id| by_id.get(id))
        .map(|e| e.content.clone())
        .collect();
    RecoveryPayload {
        task: ctx.task.clone(),
        phase: ctx.phase,
        recent_summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventContext, EventType, Outcome};

    #[test]
    fn starting_implementation_advances_phase() {
        let mut ctx = start_session("p", "s1", 20, Utc::now());
        observe_turn(&mut ctx, Uuid::new_v4(), "starting implementation now");
        assert_eq!(ctx.phase, Phase::Executing);
    }

    #[test]
    fn marker_cannot_move_phase_backward() {
        let mut ctx = start_session("p", "s1", 20, Utc::now());
        ctx.phase = Phase::Verifying;
        observe_turn(&mut ctx, Uuid::new_v4(), "let's plan this out");
        assert_eq!(ctx.phase, Phase::Verifying);
    }

    #[test]
    fn recovery_marker_is_detected() {
        assert!(is_recovery_request("sorry, where were we?"));
        assert!(!is_recovery_request("what is the retry budget"));
    }

    #[test]
    fn recovery_payload_carries_recent_summaries_newest_first() {
        let mut ctx = start_session("p", "s1", 20, Utc::now());
        let e1 = Event::new("p", "s1", EventType::Action, "first", Outcome::Success, EventContext::default(), Utc::now());
        let e2 = Event::new("p", "s1", EventType::Action, "second", Outcome::Success, EventContext::default(), Utc::now());
        ctx.push_event(e1.id);
        ctx.push_event(e2.id);
        let payload = synthesize_recovery(&ctx, &[e1, e2]);
        assert_eq!(payload.recent_summaries, vec!["second".to_string(), "first".to_string()]);
    }
}
