//! Typo-tolerant fallback search used when the lexical path returns nothing
//! (SPEC_FULL §4, grounded in the teacher's `search/fuzzy.rs` use of `strsim`).

use strsim::jaro_winkler;
use uuid::Uuid;

/// Rank `(id, text)` candidates against `query` by Jaro-Winkler similarity,
/// returning the top `k` above `min_similarity`.
#[must_use]
pub fn fuzzy_rank(query: &str, candidates: &[(Uuid, &str)], k: usize, min_similarity: f64) -> Vec<(Uuid, f64)> {
    let query = query.to_lowercase();
    let mut scored: Vec<(Uuid, f64)> = candidates
        .iter()
        .map(|(id, text)| {
            let text = text.to_lowercase();
            let best = text
                .split_whitespace()
                .chain(std::iter::once(text.as_str()))
                .map(|window| jaro_winkler(&query, window))
                .fold(0.0_f64, f64::max);
            (*id, best)
        })
        .filter(|(_, score)| *score >= min_similarity)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_still_matches_close_candidate() {
        let a = Uuid::new_v4();
        let candidates = vec![(a, "refresh token rotation")];
        let results = fuzzy_rank("refrsh tokn", &candidates, 5, 0.6);
        assert_eq!(results[0].0, a);
    }

    #[test]
    fn below_threshold_candidates_are_excluded() {
        let a = Uuid::new_v4();
        let candidates = vec![(a, "completely unrelated text")];
        let results = fuzzy_rank("token expiry", &candidates, 5, 0.9);
        assert!(results.is_empty());
    }
}
