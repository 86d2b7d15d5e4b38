//! Task/goal phase-transition rules (spec §3 `Task` invariants).

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::types::{Phase, Task, TaskStatus};

/// Attempt a phase transition. Forward-only unless `replan` is set, in which
/// case any phase is reachable (spec §3 "forward-only except via explicit replan").
pub fn transition_phase(task: &mut Task, next: Phase, replan: bool) -> Result<()> {
    if !replan && !task.phase.can_advance_to(next) {
        return Err(Error::InvalidArgument(format!(
            "cannot move task {} from {:?} to {:?} without replan",
            task.id, task.phase, next
        )));
    }
    task.phase = next;
    Ok(())
}

/// Mark a task completed, setting `completed_at` (spec §3 invariant
/// "`completed_at` set iff `status = completed`").
pub fn complete_task(task: &mut Task, at: DateTime<Utc>) {
    task.status = TaskStatus::Completed;
    task.phase = Phase::Completed;
    task.completed_at = Some(at);
}

/// Whether a task is overdue relative to `now` (spec §4.1 `overdue` query).
#[must_use]
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    matches!(
        task.due_at,
        Some(due) if due < now && task.status != TaskStatus::Completed && task.status != TaskStatus::Cancelled
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn task() -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: "p".into(),
            content: "do thing".into(),
            priority: crate::types::Priority::Medium,
            status: TaskStatus::Active,
            phase: Phase::Planning,
            assignee: None,
            due_at: None,
            triggers: vec![],
            goal_id: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn forward_transition_succeeds() {
        let mut t = task();
        transition_phase(&mut t, Phase::Executing, false).unwrap();
        assert_eq!(t.phase, Phase::Executing);
    }

    #[test]
    fn backward_transition_without_replan_fails() {
        let mut t = task();
        t.phase = Phase::Executing;
        assert!(transition_phase(&mut t, Phase::Planning, false).is_err());
    }

    #[test]
    fn backward_transition_with_replan_succeeds() {
        let mut t = task();
        t.phase = Phase::Executing;
        transition_phase(&mut t, Phase::Planning, true).unwrap();
        assert_eq!(t.phase, Phase::Planning);
    }

    #[test]
    fn completing_sets_completed_at() {
        let mut t = task();
        let now = Utc::now();
        complete_task(&mut t, now);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_at, Some(now));
    }

    #[test]
    fn overdue_requires_unfinished_status() {
        let mut t = task();
        let now = Utc::now();
        t.due_at = Some(now - Duration::days(1));
        assert!(is_overdue(&t, now));
        complete_task(&mut t, now);
        assert!(!is_overdue(&t, now));
    }
}
