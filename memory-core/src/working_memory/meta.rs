//! The meta layer: coverage, expertise, cognitive load and gap analysis
//! (spec §4.5 "Meta layer").

use std::collections::HashMap;

use crate::types::{Event, Outcome};

/// Coverage statistics for one domain.
#[derive(Debug, Clone, Default)]
pub struct DomainCoverage {
    pub domain: String,
    pub count: usize,
    pub avg_quality: f64,
}

/// A reported gap: a domain with inconsistent memories or low coverage
/// relative to observed query load (spec §4.5 `find_gaps`).
#[derive(Debug, Clone)]
pub struct Gap {
    pub domain: String,
    pub reason: String,
}

/// A snapshot of memory-system health (spec §4.5 `memory_health`).
#[derive(Debug, Clone)]
pub struct MemoryHealthReport {
    pub coverage: Vec<DomainCoverage>,
    pub cognitive_load: f64,
    pub gaps: Vec<Gap>,
    pub recommendations: Vec<String>,
}

/// Tracks per-domain expertise as an exponential moving average over
/// success outcomes (spec §4.5 `expertise(domain) ∈ [0,1]`).
#[derive(Debug, Default)]
pub struct ExpertiseTracker {
    ema: HashMap<String, f64>,
    alpha: f64,
}

impl ExpertiseTracker {
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            ema: HashMap::new(),
            alpha,
        }
    }

    /// Record one outcome for a domain, updating its EMA.
    pub fn observe(&mut self, domain: &str, outcome: Outcome) {
        let signal = match outcome {
            Outcome::Success => 1.0,
            Outcome::Partial => 0.5,
            Outcome::Failure => 0.0,
            Outcome::Ongoing | Outcome::None => return,
        };
        let entry = self.ema.entry(domain.to_string()).or_insert(signal);
        *entry = self.alpha * signal + (1.0 - self.alpha) * *entry;
    }

    #[must_use]
    pub fn expertise(&self, domain: &str) -> f64 {
        self.ema.get(domain).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn expertise_map(&self) -> HashMap<String, f64> {
        self.ema.clone()
    }
}

/// Compute per-domain coverage from a set of episodic events grouped by
/// `context.task` (used as a coarse domain proxy; spec §4.5 `coverage`).
#[must_use]
pub fn compute_coverage(events: &[Event]) -> Vec<DomainCoverage> {
    let mut grouped: HashMap<String, Vec<&Event>> = HashMap::new();
    for event in events {
        let domain = event
            .context
            .task
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        grouped.entry(domain).or_default().push(event);
    }
    grouped
        .into_iter()
        .map(|(domain, events)| {
            let avg_quality = events
                .iter()
                .map(|e| e.consolidation_score.max(e.importance_score))
                .sum::<f64>()
                / events.len() as f64;
            DomainCoverage {
                domain,
                count: events.len(),
                avg_quality,
            }
        })
        .collect()
}

/// Find domains with low coverage relative to a minimum observed sample
/// count, or with low average quality (spec §4.5 `find_gaps`).
#[must_use]
pub fn find_gaps(coverage: &[DomainCoverage], min_count: usize, min_quality: f64) -> Vec<Gap> {
    coverage
        .iter()
        .filter_map(|c| {
            if c.count < min_count {
                Some(Gap {
                    domain: c.domain.clone(),
                    reason: format!("only {} observations (< {min_count})", c.count),
                })
            } else if c.avg_quality < min_quality {
                Some(Gap {
                    domain: c.domain.clone(),
                    reason: format!("average quality {:.2} (< {min_quality})", c.avg_quality),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Build a [`MemoryHealthReport`] from coverage and occupancy (spec §4.5).
#[must_use]
pub fn memory_health(
    events: &[Event],
    occupancy: usize,
    capacity: usize,
    min_count: usize,
    min_quality: f64,
) -> MemoryHealthReport {
    let coverage = compute_coverage(events);
    let gaps = find_gaps(&coverage, min_count, min_quality);
    let cognitive_load = occupancy as f64 / capacity.max(1) as f64;
    let mut recommendations = Vec::new();
    if cognitive_load > 0.85 {
        recommendations.push("working memory is near capacity; consider consolidating soon".to_string());
    }
    for gap in &gaps {
        recommendations.push(format!("low coverage in '{}': {}", gap.domain, gap.reason));
    }
    MemoryHealthReport {
        coverage,
        cognitive_load,
        gaps,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventContext, EventType};
    use chrono::Utc;

    fn event(task: &str, outcome: Outcome, quality: f64) -> Event {
        let mut ctx = EventContext::default();
        ctx.task = Some(task.to_string());
        let mut e = Event::new("p", "s", EventType::Action, "x", outcome, ctx, Utc::now());
        e.consolidation_score = quality;
        e
    }

    #[test]
    fn coverage_groups_by_task_domain() {
        let events = vec![
            event("auth", Outcome::Success, 0.8),
            event("auth", Outcome::Success, 0.6),
            event("logging", Outcome::Failure, 0.1),
        ];
        let coverage = compute_coverage(&events);
        let auth = coverage.iter().find(|c| c.domain == "auth").unwrap();
        assert_eq!(auth.count, 2);
        assert!((auth.avg_quality - 0.7).abs() < 1e-9);
    }

    #[test]
    fn gaps_flag_low_count_and_low_quality() {
        let coverage = vec![
            DomainCoverage { domain: "rare".into(), count: 1, avg_quality: 0.9 },
            DomainCoverage { domain: "poor".into(), count: 10, avg_quality: 0.1 },
            DomainCoverage { domain: "healthy".into(), count: 10, avg_quality: 0.9 },
        ];
        let gaps = find_gaps(&coverage, 3, 0.3);
        let domains: Vec<&str> = gaps.iter().map(|g| g.domain.as_str()).collect();
        assert!(domains.contains(&"rare"));
        assert!(domains.contains(&"poor"));
        assert!(!domains.contains(&"healthy"));
    }

    #[test]
    fn expertise_tracker_ema_moves_toward_recent_outcomes() {
        let mut tracker = ExpertiseTracker::new(0.5);
        tracker.observe("auth", Outcome::Failure);
        tracker.observe("auth", Outcome::Success);
        let e = tracker.expertise("auth");
        assert!(e > 0.0 && e < 1.0);
    }

    #[test]
    fn high_occupancy_triggers_recommendation() {
        let report = memory_health(&[], 7, 7, 3, 0.3);
        assert!((report.cognitive_load - 1.0).abs() < 1e-9);
        assert!(report.recommendations.iter().any(|r| r.contains("capacity")));
    }
}
