//! Strategy-to-parameter mapping (spec §4.2 "configurable via named
//! strategies: `minimal`, `speed`, `balanced`, `quality`").

use crate::config::ConsolidationConfig;
use crate::types::ConsolidationStrategy;

/// Resolved knobs for one consolidation run, derived from the named
/// strategy and the configured base values.
#[derive(Debug, Clone, Copy)]
pub struct StrategyParams {
    pub cluster_tau: f64,
    pub temporal_half_life_min: f64,
    /// Events above this uncertainty require System 2 validation.
    pub validation_threshold: f64,
    /// Whether System 2 validation runs at all for this strategy.
    pub use_system2: bool,
    /// Minimum candidate support (cluster size) to promote without review.
    pub min_support: usize,
}

impl StrategyParams {
    #[must_use]
    pub fn for_strategy(strategy: ConsolidationStrategy, base: ConsolidationConfig) -> Self {
        match strategy {
            ConsolidationStrategy::Minimal => Self {
                cluster_tau: base.cluster_tau * 0.7,
                temporal_half_life_min: base.temporal_half_life_min,
                validation_threshold: 1.1,
                use_system2: false,
                min_support: 4,
            },
            ConsolidationStrategy::Speed => Self {
                cluster_tau: base.cluster_tau,
                temporal_half_life_min: base.temporal_half_life_min,
                validation_threshold: 1.1,
                use_system2: false,
                min_support: 2,
            },
            ConsolidationStrategy::Balanced => Self {
                cluster_tau: base.cluster_tau,
                temporal_half_life_min: base.temporal_half_life_min,
                validation_threshold: base.validation_threshold,
                use_system2: true,
                min_support: 2,
            },
            ConsolidationStrategy::Quality => Self {
                cluster_tau: base.cluster_tau * 1.2,
                temporal_half_life_min: base.temporal_half_life_min,
                validation_threshold: 0.0,
                use_system2: true,
                min_support: 1,
            },
        }
    }
}
