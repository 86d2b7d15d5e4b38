//! `procedural.*` operations: reusable templated workflows (spec §4.1
//! "Procedural store").

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{Envelope, Operation};
use memory_core::types::{Outcome, Procedure, ProcedureExecution, ProcedureParam};

use crate::common::{opt_f64, opt_usize, parse_field, require_str, require_uuid};

pub struct StoreProcedure;

#[async_trait]
impl Operation for StoreProcedure {
    fn id(&self) -> &'static str {
        "procedural.store"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["name", "category", "template"],
            "properties": {
                "name": {"type": "string"},
                "category": {"type": "string"},
                "template": {"type": "string"},
                "params": {"type": "array"},
                "trigger_pattern": {"type": "string"},
                "examples": {"type": "array", "items": {"type": "string"}},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let name = require_str(&args, "name")?;
        let category = require_str(&args, "category")?;
        let template = require_str(&args, "template")?;
        let params: Vec<ProcedureParam> = parse_field(&args, "params")?.unwrap_or_default();
        let examples: Vec<String> = parse_field(&args, "examples")?.unwrap_or_default();
        let trigger_pattern = crate::common::opt_str(&args, "trigger_pattern").map(str::to_string);
        let now = ctx.clock.now();

        let existing = ctx.storage.get_procedure_by_name(project_id, name).await?;
        let procedure = Procedure {
            id: existing.as_ref().map_or_else(uuid::Uuid::new_v4, |p| p.id),
            project_id: project_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            template: template.to_string(),
            params,
            success_rate: existing.as_ref().map_or(0.0, |p| p.success_rate),
            usage_count: existing.as_ref().map_or(0, |p| p.usage_count),
            avg_duration_ms: existing.as_ref().map_or(0.0, |p| p.avg_duration_ms),
            trigger_pattern,
            examples,
            source_event_ids: existing.map_or_else(Vec::new, |p| p.source_event_ids),
            created_at: now,
        };
        let id = ctx.storage.upsert_procedure(procedure).await?;
        Ok(Envelope::ok(format!("stored procedure '{name}'"), serde_json::json!({"id": id})))
    }
}

pub struct GetProcedure;

#[async_trait]
impl Operation for GetProcedure {
    fn id(&self) -> &'static str {
        "procedural.get"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"properties": {"id": {"type": "string"}, "name": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let procedure = if let Some(id) = crate::common::opt_uuid(&args, "id")? {
            ctx.storage.get_procedure(id).await?.ok_or_else(|| Error::not_found_id("procedure", id))?
        } else {
            let name = require_str(&args, "name")?;
            ctx.storage
                .get_procedure_by_name(project_id, name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("procedure '{name}'")))?
        };
        Ok(Envelope::ok(format!("procedure '{}'", procedure.name), serde_json::to_value(procedure)?))
    }
}

pub struct ListProcedures;

#[async_trait]
impl Operation for ListProcedures {
    fn id(&self) -> &'static str {
        "procedural.list"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"properties": {"limit": {"type": "integer", "default": 10}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let limit = opt_usize(&args, "limit", 10).clamp(1, memory_core::types::MAX_PAGE_LIMIT);
        let procedures = ctx.storage.list_procedures(project_id, limit).await?;
        Ok(Envelope::ok(format!("{} procedure(s)", procedures.len()), serde_json::to_value(procedures)?))
    }
}

pub struct RecordExecution;

#[async_trait]
impl Operation for RecordExecution {
    fn id(&self) -> &'static str {
        "procedural.record_execution"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["procedure_id", "outcome", "duration_ms"],
            "properties": {
                "procedure_id": {"type": "string"},
                "outcome": {"type": "string"},
                "duration_ms": {"type": "integer"},
                "learned": {"type": "string"},
                "variables": {"type": "object"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let procedure_id = require_uuid(&args, "procedure_id")?;
        let outcome: Outcome = crate::common::require_enum(&args, "outcome")?;
        let duration_ms = crate::common::opt_u64(&args, "duration_ms")
            .ok_or_else(|| Error::InvalidArgument("missing required field 'duration_ms'".into()))?;
        let learned = crate::common::opt_str(&args, "learned").map(str::to_string);
        let variables = args.get("variables").cloned().unwrap_or(serde_json::Value::Null);
        let now = ctx.clock.now();

        let mut procedure = ctx
            .storage
            .get_procedure(procedure_id)
            .await?
            .ok_or_else(|| Error::not_found_id("procedure", procedure_id))?;

        let execution = ProcedureExecution {
            id: uuid::Uuid::new_v4(),
            procedure_id,
            project_id: project_id.to_string(),
            outcome,
            duration_ms,
            learned,
            variables,
            at: now,
        };
        let exec_id = ctx.storage.record_execution(execution).await?;

        let successes = procedure.success_rate * procedure.usage_count as f64;
        let new_count = procedure.usage_count + 1;
        let new_successes = successes + if outcome == Outcome::Success { 1.0 } else { 0.0 };
        procedure.success_rate = new_successes / new_count as f64;
        procedure.avg_duration_ms =
            (procedure.avg_duration_ms * procedure.usage_count as f64 + duration_ms as f64) / new_count as f64;
        procedure.usage_count = new_count;
        ctx.storage.upsert_procedure(procedure).await?;

        Ok(Envelope::ok(
            format!("recorded execution {exec_id} for procedure {procedure_id}"),
            serde_json::json!({"id": exec_id}),
        ))
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
    async fn store_then_get_by_name_round_trips() {
        let ctx = ctx();
        StoreProcedure
            .execute(
                &ctx,
                "p1",
                serde_json::json!({"name": "deploy", "category": "ops", "template": "run deploy.sh"}),
            )
            .await
            .unwrap();
        let got = GetProcedure.execute(&ctx, "p1", serde_json::json!({"name": "deploy"})).await.unwrap();
        assert_eq!(got.data["name"], "deploy");
    }

    #[tokio::test]
    async fn record_execution_updates_success_rate() {
        let ctx = ctx();
        let stored = StoreProcedure
            .execute(
                &ctx,
                "p1",
                serde_json::json!({"name": "deploy", "category": "ops", "template": "run deploy.sh"}),
            )
            .await
            .unwrap();
        let id = stored.data["id"].as_str().unwrap();
        RecordExecution
            .execute(
                &ctx,
                "p1",
                serde_json::json!({"procedure_id": id, "outcome": "success", "duration_ms": 100}),
            )
            .await
            .unwrap();
        let got = GetProcedure.execute(&ctx, "p1", serde_json::json!({"id": id})).await.unwrap();
        assert_eq!(got.data["success_rate"], 1.0);
        assert_eq!(got.data["usage_count"], 1);
    }
}
