//! Summary returned by one consolidation run (spec §4.2 step 6).

use crate::types::ConsolidationStrategy;

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ConsolidationReport {
    pub events_considered: usize,
    pub events_consolidated: usize,
    pub clusters_formed: usize,
    pub patterns_extracted: usize,
    pub memories_created: usize,
    pub procedures_created: usize,
    pub deferred_to_system2: usize,
    pub rejected: usize,
    pub compression_ratio: f64,
    pub duration_ms: u64,
    #[serde(skip)]
    pub strategy: Option<ConsolidationStrategy>,
}

impl ConsolidationReport {
    /// `events_consolidated / events_considered`, `0.0` when nothing ran
    /// (spec §4.2 "compression_ratio").
    pub fn finalize(&mut self) {
        self.compression_ratio = if self.events_considered == 0 {
            0.0
        } else {
            self.events_consolidated as f64 / self.events_considered as f64
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_ratio_is_zero_when_nothing_considered() {
        let mut report = ConsolidationReport::default();
        report.finalize();
        assert_eq!(report.compression_ratio, 0.0);
    }

    #[test]
    fn compression_ratio_divides_consolidated_by_considered() {
        let mut report = ConsolidationReport {
            events_considered: 10,
            events_consolidated: 4,
            ..Default::default()
        };
        report.finalize();
        assert!((report.compression_ratio - 0.4).abs() < 1e-9);
    }
}
