//! `meta.*` operations: coverage, expertise and cognitive-load reporting
//! over the rest of the engine (spec §4.5 "Meta layer").
//!
//! The working-memory buffer itself is session-scoped runtime state owned
//! by the hook dispatcher, not the storage backend, so `memory_health`
//! takes the caller's current occupancy as an argument rather than reading
//! it back out of storage.

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::Result;
use memory_core::ops::{Envelope, Operation};
use memory_core::storage::EventFilter;
use memory_core::working_memory::meta::{compute_coverage, find_gaps, memory_health};

use crate::common::opt_usize;

const COVERAGE_LOOKBACK_DAYS: i64 = 30;
const DEFAULT_MIN_COUNT: usize = 3;
const DEFAULT_MIN_QUALITY: f64 = 0.3;

pub struct MemoryHealth;

#[async_trait]
impl Operation for MemoryHealth {
    fn id(&self) -> &'static str {
        "meta.memory_health"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "occupancy": {"type": "integer", "default": 0},
                "min_count": {"type": "integer"},
                "min_quality": {"type": "number"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let now = ctx.clock.now();
        let from = now - chrono::Duration::days(COVERAGE_LOOKBACK_DAYS);
        let events = ctx.storage.get_range(project_id, from, now, &EventFilter::default()).await?;

        let occupancy = opt_usize(&args, "occupancy", 0);
        let capacity = ctx.config.working_memory.capacity;
        let min_count = opt_usize(&args, "min_count", DEFAULT_MIN_COUNT);
        let min_quality = crate::common::opt_f64(&args, "min_quality").unwrap_or(DEFAULT_MIN_QUALITY);

        let report = memory_health(&events, occupancy, capacity, min_count, min_quality);
        let data = serde_json::json!({
            "coverage": report.coverage.iter().map(|c| serde_json::json!({
                "domain": c.domain, "count": c.count, "avg_quality": c.avg_quality,
            })).collect::<Vec<_>>(),
            "cognitive_load": report.cognitive_load,
            "gaps": report.gaps.iter().map(|g| serde_json::json!({"domain": g.domain, "reason": g.reason})).collect::<Vec<_>>(),
            "recommendations": report.recommendations,
        });
        Ok(Envelope::ok(
            format!("cognitive load {:.0}%, {} gap(s)", report.cognitive_load * 100.0, report.gaps.len()),
            data,
        ))
    }
}

pub struct FindGaps;

#[async_trait]
impl Operation for FindGaps {
    fn id(&self) -> &'static str {
        "meta.find_gaps"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "properties": {"min_count": {"type": "integer"}, "min_quality": {"type": "number"}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let now = ctx.clock.now();
        let from = now - chrono::Duration::days(COVERAGE_LOOKBACK_DAYS);
        let events = ctx.storage.get_range(project_id, from, now, &EventFilter::default()).await?;
        let coverage = compute_coverage(&events);
        let min_count = opt_usize(&args, "min_count", DEFAULT_MIN_COUNT);
        let min_quality = crate::common::opt_f64(&args, "min_quality").unwrap_or(DEFAULT_MIN_QUALITY);
        let gaps = find_gaps(&coverage, min_count, min_quality);
        let data: Vec<serde_json::Value> = gaps.iter().map(|g| serde_json::json!({"domain": g.domain, "reason": g.reason})).collect();
        Ok(Envelope::ok(format!("{} gap(s)", gaps.len()), serde_json::json!(data)))
    }
}

pub struct DomainCoverageOp;

#[async_trait]
impl Operation for DomainCoverageOp {
    fn id(&self) -> &'static str {
        "meta.coverage"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, _args: serde_json::Value) -> Result<Envelope> {
        let now = ctx.clock.now();
        let from = now - chrono::Duration::days(COVERAGE_LOOKBACK_DAYS);
        let events = ctx.storage.get_range(project_id, from, now, &EventFilter::default()).await?;
        let coverage = compute_coverage(&events);
        let data: Vec<serde_json::Value> = coverage
            .iter()
            .map(|c| serde_json::json!({"domain": c.domain, "count": c.count, "avg_quality": c.avg_quality}))
            .collect();
        Ok(Envelope::ok(format!("{} domain(s) covered", coverage.len()), serde_json::json!(data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStorage;
    use memory_core::clock::FixedClock;
    use memory_core::embeddings::DeterministicEmbeddingProvider;
    use memory_core::llm::MockLlmClient;
    use std::sync::Arc;

    fn ctx() -> EngineContext {
        EngineContext::new(
            Arc::new(FakeStorage::default()),
            Arc::new(DeterministicEmbeddingProvider::default()),
            Arc::new(MockLlmClient::default()),
            Arc::new(FixedClock::new(chrono::Utc::now())),
            memory_core::config::EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_project_has_no_gaps_and_zero_load() {
        let ctx = ctx();
        let result = MemoryHealth.execute(&ctx, "p1", serde_json::json!({})).await.unwrap();
        assert_eq!(result.data["gaps"].as_array().unwrap().len(), 0);
        assert_eq!(result.data["cognitive_load"], 0.0);
    }

    #[tokio::test]
    async fn near_capacity_occupancy_surfaces_recommendation() {
        let ctx = ctx();
        let result = MemoryHealth.execute(&ctx, "p1", serde_json::json!({"occupancy": 7})).await.unwrap();
        let recs = result.data["recommendations"].as_array().unwrap();
        assert!(recs.iter().any(|r| r.as_str().unwrap().contains("capacity")));
    }
}
