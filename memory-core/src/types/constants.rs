//! System-wide numeric defaults named throughout spec §3–§6.
//!
//! These are the fallback values used when [`crate::config::EngineConfig`]
//! does not override them; every one of them is configurable.

/// Embedding vector dimensionality (spec §6, "same dimensionality D").
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Reciprocal-rank-fusion constant (spec §4.1).
pub const RRF_K: f64 = 60.0;

/// Candidate fanout multiplier per source before fusion (spec §4.1/§4.3).
pub const DEFAULT_OVER_FETCH: usize = 3;

/// Working-memory capacity, 7 ± 2 (spec §4.5).
pub const DEFAULT_WORKING_MEMORY_CAPACITY: usize = 7;

/// Composite eviction weight favouring salience over recency (spec §4.5).
pub const DEFAULT_WORKING_MEMORY_ALPHA: f64 = 0.7;

/// Reinforcement increment on re-reference (spec §4.5).
pub const DEFAULT_SALIENCE_REINFORCEMENT: f64 = 0.15;

/// Per-minute decay factor for working-memory salience (spec §4.5).
pub const DEFAULT_SALIENCE_DECAY_PER_MIN: f64 = 0.98;

/// Composite threshold above which an evictee is routed to persistent
/// storage instead of being dropped (spec §4.5).
pub const DEFAULT_CONSOLIDATION_ROUTE_THRESHOLD: f64 = 0.6;

/// Default recall composite rescoring weights (spec §4.3); must sum to 1.0.
pub const DEFAULT_WEIGHT_SEMANTIC: f64 = 0.6;
pub const DEFAULT_WEIGHT_RECENCY: f64 = 0.2;
pub const DEFAULT_WEIGHT_USEFULNESS: f64 = 0.2;

/// Recency half-life in days used by the composite recency term (spec §4.3).
pub const DEFAULT_RECENCY_TAU_DAYS: f64 = 30.0;

/// Cluster-joining distance threshold τ₁ (spec §4.2).
pub const DEFAULT_CLUSTER_TAU: f64 = 0.35;

/// Uncertainty threshold above which System 2 (LLM) validation is required
/// (spec §4.2).
pub const DEFAULT_VALIDATION_THRESHOLD: f64 = 0.5;

/// Temporal proximity half-life for clustering, in minutes (spec §4.2).
pub const DEFAULT_TEMPORAL_HALF_LIFE_MIN: f64 = 30.0;

/// Number of structural graph changes that trigger background community
/// detection (spec §4.1).
pub const DEFAULT_COMMUNITY_DETECT_INTERVAL: u64 = 500;

/// Hook idempotency window in seconds (spec §4.4).
pub const DEFAULT_IDEMPOTENCY_WINDOW_S: u64 = 30;

/// Hook rate limit, tokens per minute (spec §4.4).
pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 30;

/// Cascade monitor max call-stack depth (spec §4.4).
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Cascade monitor max fan-out per firing chain (spec §4.4).
pub const DEFAULT_MAX_BREADTH: usize = 10;

/// Size of the session-context recent-events ring buffer (spec §3/§4.4).
pub const DEFAULT_SESSION_RING_SIZE: usize = 20;

/// Default pagination limit and ceiling for the operation envelope (spec §4.6).
pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Retention window, in days, after which consolidated/archived events become
/// eligible for archival (spec §4.1).
pub const DEFAULT_RETENTION_DAYS: i64 = 90;
