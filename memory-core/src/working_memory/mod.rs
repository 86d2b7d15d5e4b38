//! Working memory and meta layer (spec §4.5).

pub mod buffer;
pub mod meta;

pub use buffer::{EvictionOutcome, WorkingMemoryBuffer};
pub use meta::{compute_coverage, find_gaps, memory_health, DomainCoverage, ExpertiseTracker, Gap, MemoryHealthReport};
