//! Composite rescoring and confidence derivation for recall results (spec
//! §4.3).

use crate::config::RecallConfig;
use crate::types::Confidence;

/// Recency term: exponential decay over `age_days` with half-life-style time
/// constant `tau_days` (spec §4.3 `exp(-age/τ)`).
#[must_use]
pub fn recency_score(age_days: f64, tau_days: f64) -> f64 {
    if tau_days <= 0.0 {
        return 0.0;
    }
    (-age_days.max(0.0) / tau_days).exp()
}

/// `w_sem * semantic + w_rec * exp(-age/τ) + w_use * usefulness` (spec §4.3
/// "Composite rescoring").
#[must_use]
pub fn composite_score(semantic: f64, age_days: f64, usefulness: f64, config: &RecallConfig) -> f64 {
    config.weight_semantic * semantic
        + config.weight_recency * recency_score(age_days, config.recency_tau_days)
        + config.weight_usefulness * usefulness
}

/// One item's constituent scores, carried alongside its `composite`
/// (spec §4.3 recall hit shape).
#[derive(Debug, Clone, Copy)]
pub struct ScoreBreakdown {
    pub semantic: f64,
    pub recency: f64,
    pub usefulness: f64,
    pub composite: f64,
}

#[must_use]
pub fn score(semantic: f64, age_days: f64, usefulness: f64, config: &RecallConfig) -> ScoreBreakdown {
    let recency = recency_score(age_days, config.recency_tau_days);
    ScoreBreakdown {
        semantic,
        recency,
        usefulness,
        composite: config.weight_semantic * semantic + config.weight_recency * recency + config.weight_usefulness * usefulness,
    }
}

/// Derive a [`Confidence`] breakdown from the aggregate recall outcome
/// (spec §4.3 confidence formula, reusing [`Confidence::compute`]).
///
/// - `semantic_relevance`: top hit's fused rank score, normalised to `[0,1]`.
/// - `source_quality`: mean `quality` across returned hits.
/// - `recency`: mean recency term across returned hits.
/// - `consistency`: `1 - normalised spread` of composite scores (agreement
///   among hits; a single hit is maximally consistent).
/// - `completeness`: `hits.len() / requested_k`, capped at `1.0`.
#[must_use]
pub fn derive_confidence(
    top_fused_score: f64,
    mean_quality: f64,
    mean_recency: f64,
    composite_scores: &[f64],
    returned: usize,
    requested_k: usize,
) -> Confidence {
    let semantic_relevance = top_fused_score.clamp(0.0, 1.0);
    let consistency = if composite_scores.len() < 2 {
        1.0
    } else {
        let mean = composite_scores.iter().sum::<f64>() / composite_scores.len() as f64;
        let variance = composite_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / composite_scores.len() as f64;
        (1.0 - variance.sqrt()).clamp(0.0, 1.0)
    };
    let completeness = if requested_k == 0 {
        1.0
    } else {
        (returned as f64 / requested_k as f64).min(1.0)
    };
    Confidence::compute(semantic_relevance, mean_quality.clamp(0.0, 1.0), mean_recency.clamp(0.0, 1.0), consistency, completeness)
}
