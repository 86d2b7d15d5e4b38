//! `consolidation.*` operations: triggering the dual-process consolidation
//! pass and the speculative dream-generation auxiliary (spec §4.2).

use async_trait::async_trait;
use memory_core::consolidation::dream::{evaluate_dream, generate_dreams};
use memory_core::consolidation::{ConsolidationEngine, ConsolidationWindow};
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::llm::CompletionRequest;
use memory_core::ops::{Envelope, Operation};
use memory_core::types::ConsolidationStrategy;

use crate::common::{opt_enum, require_uuid};

fn window_from_args(args: &serde_json::Value) -> Result<ConsolidationWindow> {
    match crate::common::opt_str(args, "window") {
        None | Some("balanced") => Ok(ConsolidationWindow::Balanced { hours: crate::common::opt_u64(args, "hours").unwrap_or(24) as i64 }),
        Some("light") => Ok(ConsolidationWindow::Light),
        Some("deep") => Ok(ConsolidationWindow::Deep),
        Some(other) => Err(Error::InvalidArgument(format!("unknown consolidation window '{other}'"))),
    }
}

pub struct RunConsolidation;

#[async_trait]
impl Operation for RunConsolidation {
    fn id(&self) -> &'static str {
        "consolidation.run"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "strategy": {"type": "string", "enum": ["minimal", "speed", "balanced", "quality"]},
                "window": {"type": "string", "enum": ["light", "balanced", "deep"], "default": "balanced"},
                "hours": {"type": "integer", "default": 24},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let strategy: ConsolidationStrategy = opt_enum(&args, "strategy", ctx.config.consolidation.strategy)?;
        let window = window_from_args(&args)?;
        let engine = ConsolidationEngine::default();
        let report = engine
            .run(
                ctx.storage.as_ref(),
                ctx.llm.as_ref(),
                ctx.embedder.as_ref(),
                &ctx.config.consolidation,
                project_id,
                strategy,
                window,
                ctx.clock.now(),
            )
            .await?;
        let summary = format!(
            "considered {}, consolidated {} ({:.0}% compression), created {} memory(ies) and {} procedure(s)",
            report.events_considered,
            report.events_consolidated,
            report.compression_ratio * 100.0,
            report.memories_created,
            report.procedures_created,
        );
        Ok(Envelope::ok(summary, serde_json::to_value(report)?))
    }
}

pub struct GenerateDreams;

#[async_trait]
impl Operation for GenerateDreams {
    fn id(&self) -> &'static str {
        "consolidation.dream_generate"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["memory_id"], "properties": {"memory_id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let memory_id = require_uuid(&args, "memory_id")?;
        let memory = ctx.storage.get_memory(memory_id).await?.ok_or_else(|| Error::not_found_id("memory", memory_id))?;
        let variants = generate_dreams(&memory, ctx.clock.now());
        Ok(Envelope::ok(format!("generated {} dream variant(s)", variants.len()), serde_json::to_value(variants)?))
    }
}

pub struct EvaluateDream;

#[async_trait]
impl Operation for EvaluateDream {
    fn id(&self) -> &'static str {
        "consolidation.dream_evaluate"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["variant_id", "content"],
            "properties": {"variant_id": {"type": "string"}, "content": {"type": "string"}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let variant_id = require_uuid(&args, "variant_id")?;
        let content = crate::common::require_str(&args, "content")?;
        if !ctx.llm.is_available() {
            return Err(Error::DependencyUnavailable("llm unavailable for dream evaluation".into()));
        }
        let prompt = format!("On a scale of 1 (most promising) to 3 (least promising), tier this speculative memory variant:\n{content}");
        let response = ctx
            .llm
            .complete(CompletionRequest {
                prompt,
                schema: None,
                max_tokens: 64,
                deadline: std::time::Duration::from_millis(ctx.config.storage.llm_timeout_ms),
            })
            .await?;
        let tier = response
            .text
            .as_deref()
            .and_then(|t| t.chars().find(char::is_ascii_digit))
            .and_then(|c| c.to_digit(10))
            .map_or(3, |d| d.clamp(1, 3) as u8);

        let mut variant = memory_core::types::DreamVariant {
            id: variant_id,
            project_id: String::new(),
            source_memory_id: None,
            content: content.to_string(),
            status: memory_core::types::DreamStatus::PendingEvaluation,
            tier: None,
            created_at: ctx.clock.now(),
        };
        evaluate_dream(&mut variant, tier);
        Ok(Envelope::ok(format!("dream {variant_id} evaluated at tier {tier}"), serde_json::to_value(variant)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::StoreMemory;
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
    async fn empty_project_consolidation_is_a_no_op() {
        let ctx = ctx();
        let result = RunConsolidation.execute(&ctx, "p1", serde_json::json!({})).await.unwrap();
        assert_eq!(result.data["events_considered"], 0);
        assert_eq!(result.data["compression_ratio"], 0.0);
    }

    #[tokio::test]
    async fn dream_generate_produces_three_variants() {
        let ctx = ctx();
        let stored = StoreMemory.execute(&ctx, "p1", serde_json::json!({"content": "retries capped at 3"})).await.unwrap();
        let id = stored.data["id"].as_str().unwrap();
        let result = GenerateDreams.execute(&ctx, "p1", serde_json::json!({"memory_id": id})).await.unwrap();
        assert_eq!(result.data.as_array().unwrap().len(), 3);
    }
}
