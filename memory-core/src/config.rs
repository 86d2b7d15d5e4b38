//! Flat, single-namespace engine configuration (spec §6 "Configuration").
//!
//! Every field is optional at the TOML level and falls back to the default
//! named in [`crate::types::constants`]. Unknown keys are rejected at parse
//! time (spec §9 redesign flag "free-form option objects").

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::constants::*;
use crate::types::ConsolidationStrategy;

/// `recall.*` configuration (spec §4.3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RecallConfig {
    pub weight_semantic: f64,
    pub weight_recency: f64,
    pub weight_usefulness: f64,
    pub tier1_deadline_ms: u64,
    pub tier2_deadline_ms: u64,
    pub tier3_deadline_ms: u64,
    pub over_fetch: usize,
    pub default_depth: u8,
    pub recency_tau_days: f64,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            weight_semantic: DEFAULT_WEIGHT_SEMANTIC,
            weight_recency: DEFAULT_WEIGHT_RECENCY,
            weight_usefulness: DEFAULT_WEIGHT_USEFULNESS,
            tier1_deadline_ms: 150,
            tier2_deadline_ms: 300,
            tier3_deadline_ms: 2000,
            over_fetch: DEFAULT_OVER_FETCH,
            default_depth: 2,
            recency_tau_days: DEFAULT_RECENCY_TAU_DAYS,
        }
    }
}

impl RecallConfig {
    /// Validate that the composite weights sum to ~1.0 (spec §4.3).
    pub fn validate(&self) -> Result<()> {
        let sum = self.weight_semantic + self.weight_recency + self.weight_usefulness;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(Error::Configuration(format!(
                "recall weights must sum to 1.0, got {sum}"
            )));
        }
        if !(1..=3).contains(&self.default_depth) {
            return Err(Error::Configuration(
                "recall.default_depth must be in 1..=3".into(),
            ));
        }
        Ok(())
    }
}

/// `consolidation.*` configuration (spec §4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConsolidationConfig {
    pub strategy: ConsolidationStrategy,
    pub validation_threshold: f64,
    pub cluster_tau: f64,
    pub temporal_half_life_min: f64,
    pub per_cluster_timeout_ms: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            strategy: ConsolidationStrategy::Balanced,
            validation_threshold: DEFAULT_VALIDATION_THRESHOLD,
            cluster_tau: DEFAULT_CLUSTER_TAU,
            temporal_half_life_min: DEFAULT_TEMPORAL_HALF_LIFE_MIN,
            per_cluster_timeout_ms: 5_000,
        }
    }
}

/// `working_memory.*` configuration (spec §4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WorkingMemoryConfig {
    pub capacity: usize,
    pub alpha: f64,
    pub decay_per_min: f64,
    pub reinforcement_delta: f64,
    pub route_threshold: f64,
}

impl Default for WorkingMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WORKING_MEMORY_CAPACITY,
            alpha: DEFAULT_WORKING_MEMORY_ALPHA,
            decay_per_min: DEFAULT_SALIENCE_DECAY_PER_MIN,
            reinforcement_delta: DEFAULT_SALIENCE_REINFORCEMENT,
            route_threshold: DEFAULT_CONSOLIDATION_ROUTE_THRESHOLD,
        }
    }
}

/// `hooks.*` configuration (spec §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HooksConfig {
    pub idempotency_window_s: u64,
    pub rate_limit_per_min: u32,
    pub max_depth: usize,
    pub max_breadth: usize,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            idempotency_window_s: DEFAULT_IDEMPOTENCY_WINDOW_S,
            rate_limit_per_min: DEFAULT_RATE_LIMIT_PER_MIN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_breadth: DEFAULT_MAX_BREADTH,
        }
    }
}

/// `storage.*` / `embedding.*` / `llm.*` configuration (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    pub retention_days: i64,
    pub embedding_dim: usize,
    pub llm_timeout_ms: u64,
    pub capacity_limit: Option<usize>,
    pub eviction_policy: crate::types::EvictionPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            llm_timeout_ms: 2_000,
            capacity_limit: None,
            eviction_policy: crate::types::EvictionPolicy::RelevanceWeighted,
        }
    }
}

/// Top-level engine configuration, composed of per-subsystem namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub recall: RecallConfig,
    pub consolidation: ConsolidationConfig,
    pub working_memory: WorkingMemoryConfig,
    pub hooks: HooksConfig,
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Parse configuration from TOML text, rejecting unknown keys.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: EngineConfig =
            toml::from_str(text).map_err(|e| Error::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate cross-field invariants that `serde` alone cannot express.
    pub fn validate(&self) -> Result<()> {
        self.recall.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml = "[recall]\nbogus_field = 1\n";
        assert!(EngineConfig::from_toml(toml).is_err());
    }

    #[test]
    fn mismatched_weights_fail_validation() {
        let mut cfg = EngineConfig::default();
        cfg.recall.weight_semantic = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_overrides_merge_with_defaults() {
        let toml = "[working_memory]\ncapacity = 9\n";
        let cfg = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(cfg.working_memory.capacity, 9);
        assert_eq!(cfg.recall.default_depth, 2);
    }
}
