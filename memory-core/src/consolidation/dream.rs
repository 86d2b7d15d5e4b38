//! Speculative auxiliary consolidation: dream generation (spec §4.2
//! "optional auxiliary step"). Produces variants of an existing memory for
//! later LLM evaluation; never runs on the request-serving path.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{DreamStatus, DreamVariant, Memory};

/// The three variant kinds spec §4.2 names: relaxing a constraint implied by
/// the memory, synthesizing across projects, and perturbing a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DreamKind {
    ConstraintRelaxed,
    CrossProjectSynthesis,
    ParameterPerturbed,
}

fn render(kind: DreamKind, memory: &Memory) -> String {
    match kind {
        DreamKind::ConstraintRelaxed => {
            format!("What if the constraint in '{}' did not hold?", memory.content)
        }
        DreamKind::CrossProjectSynthesis => {
            format!("Does '{}' generalize beyond project {}?", memory.content, memory.project_id)
        }
        DreamKind::ParameterPerturbed => {
            format!("Variant of '{}' with parameters perturbed", memory.content)
        }
    }
}

/// Produce one pending [`DreamVariant`] per kind for `memory` (spec §4.2
/// dream generation; §3 `DreamVariant`).
#[must_use]
pub fn generate_dreams(memory: &Memory, now: DateTime<Utc>) -> Vec<DreamVariant> {
    [
        DreamKind::ConstraintRelaxed,
        DreamKind::CrossProjectSynthesis,
        DreamKind::ParameterPerturbed,
    ]
    .into_iter()
    .map(|kind| DreamVariant {
        id: Uuid::new_v4(),
        project_id: memory.project_id.clone(),
        source_memory_id: Some(memory.id),
        content: render(kind, memory),
        status: DreamStatus::PendingEvaluation,
        tier: None,
        created_at: now,
    })
    .collect()
}

/// Record an LLM evaluation verdict against a pending variant, assigning it
/// a usefulness tier (1 = most promising).
pub fn evaluate_dream(variant: &mut DreamVariant, tier: u8) {
    variant.status = DreamStatus::Evaluated;
    variant.tier = Some(tier);
}
