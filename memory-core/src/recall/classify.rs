//! Lexical-marker query classification (spec §4.3 "Query routing").
//!
//! Classification is a fixed precedence chain over marker word lists rather
//! than a learned classifier (spec §9 redesign flag: typed, inspectable
//! routing over implicit dispatch). Precedence, highest first: planning,
//! procedural, relational, temporal, prospective, meta, falling back to
//! factual.

use crate::types::QueryType;

const PLANNING_MARKERS: &[&str] = &["should i", "what's next", "plan for", "how should we approach"];
const PROCEDURAL_MARKERS: &[&str] = &["how do i", "how to", "steps to", "procedure for"];
const RELATIONAL_MARKERS: &[&str] = &["related to", "connected to", "depends on", "who uses", "what uses"];
const TEMPORAL_MARKERS: &[&str] = &["when did", "yesterday", "last time", "recently", "last week"];
const PROSPECTIVE_MARKERS: &[&str] = &["what's due", "overdue", "my tasks", "pending task", "deadline"];
const META_MARKERS: &[&str] = &["how much do you know", "memory coverage", "knowledge gaps", "what don't you know"];

fn matches_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Classify `query_text` into a [`QueryType`] by fixed marker precedence.
#[must_use]
pub fn classify(query_text: &str) -> QueryType {
    let lowered = query_text.to_lowercase();
    if matches_any(&lowered, PLANNING_MARKERS) {
        QueryType::Planning
    } else if matches_any(&lowered, PROCEDURAL_MARKERS) {
        QueryType::Procedural
    } else if matches_any(&lowered, RELATIONAL_MARKERS) {
        QueryType::Relational
    } else if matches_any(&lowered, TEMPORAL_MARKERS) {
        QueryType::Temporal
    } else if matches_any(&lowered, PROSPECTIVE_MARKERS) {
        QueryType::Prospective
    } else if matches_any(&lowered, META_MARKERS) {
        QueryType::Meta
    } else {
        QueryType::Factual
    }
}
