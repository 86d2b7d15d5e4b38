//! The compile-time operation registry (spec §4.6 redesign flag: a typed
//! table of [`Operation`] impls replacing dynamic dispatch through a
//! monolithic handler, generalised from the teacher's
//! `server/tools/registry` lazy-tool-loading pattern to be transport-agnostic).

use std::collections::HashMap;
use std::sync::Arc;

use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{reject_credential_args, validate_layer_namespace, Envelope, Operation, LAYERS};

use crate::{consolidation, episodic, graph, meta, procedural, prospective, recall, semantic};

/// A fixed table of every registered operation, indexed by its namespaced id.
/// Built once at startup; `invoke` never mutates it (spec §4.6 "registered
/// into a static table").
pub struct Registry {
    operations: HashMap<&'static str, Arc<dyn Operation>>,
}

impl Default for Registry {
    fn default() -> Self {
        let ops: Vec<Arc<dyn Operation>> = vec![
            Arc::new(episodic::AppendEvent),
            Arc::new(episodic::GetEvent),
            Arc::new(episodic::RangeEvents),
            Arc::new(episodic::EventsBySession),
            Arc::new(episodic::ArchiveEligible),
            Arc::new(episodic::PutCursor),
            Arc::new(episodic::GetCursor),
            Arc::new(semantic::StoreMemory),
            Arc::new(semantic::GetMemory),
            Arc::new(semantic::ListMemories),
            Arc::new(semantic::SearchMemories),
            Arc::new(procedural::StoreProcedure),
            Arc::new(procedural::GetProcedure),
            Arc::new(procedural::ListProcedures),
            Arc::new(procedural::RecordExecution),
            Arc::new(prospective::CreateTask),
            Arc::new(prospective::GetTask),
            Arc::new(prospective::TransitionTaskPhase),
            Arc::new(prospective::CompleteTask),
            Arc::new(prospective::PendingTasks),
            Arc::new(prospective::BlockingTasks),
            Arc::new(prospective::OverdueTasks),
            Arc::new(prospective::TasksByPhase),
            Arc::new(prospective::TasksByGoal),
            Arc::new(prospective::CreateGoal),
            Arc::new(prospective::GetGoal),
            Arc::new(graph::UpsertEntity),
            Arc::new(graph::GetEntity),
            Arc::new(graph::UpsertRelation),
            Arc::new(graph::AddObservation),
            Arc::new(graph::Neighbours),
            Arc::new(graph::ShortestPath),
            Arc::new(graph::CommunityDetect),
            Arc::new(meta::MemoryHealth),
            Arc::new(meta::FindGaps),
            Arc::new(meta::DomainCoverageOp),
            Arc::new(consolidation::RunConsolidation),
            Arc::new(consolidation::GenerateDreams),
            Arc::new(consolidation::EvaluateDream),
            Arc::new(recall::RecallQuery),
        ];

        let mut operations = HashMap::with_capacity(ops.len());
        for op in ops {
            let id = op.id();
            validate_layer_namespace(id).expect("built-in operation ids are always well-formed");
            let replaced = operations.insert(id, op);
            assert!(replaced.is_none(), "duplicate operation id '{id}' registered");
        }
        Self { operations }
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one call by namespaced operation id (spec §4.6 `invoke`).
    /// Validation failures and operation errors both surface as `Err`; the
    /// binary wiring this registry into a transport is responsible for
    /// turning that into an error [`Envelope`] via [`Envelope::error`].
    pub async fn invoke(
        &self,
        ctx: &EngineContext,
        project_id: &str,
        operation_id: &str,
        args: serde_json::Value,
    ) -> Result<Envelope> {
        validate_layer_namespace(operation_id)?;
        reject_credential_args(&args)?;
        let operation = self
            .operations
            .get(operation_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown operation '{operation_id}'")))?;
        operation.execute(ctx, project_id, args).await
    }

    /// The eight layers operations are namespaced under (spec §4.6
    /// `list_layers` mandatory meta-operation).
    #[must_use]
    pub fn list_layers(&self) -> Envelope {
        Envelope::ok(format!("{} layer(s)", LAYERS.len()), serde_json::json!(LAYERS))
    }

    /// Every operation id registered under `layer` (spec §4.6
    /// `list_operations` mandatory meta-operation).
    #[must_use]
    pub fn list_operations(&self, layer: &str) -> Envelope {
        let mut ids: Vec<&str> = self
            .operations
            .keys()
            .copied()
            .filter(|id| id.split_once('.').is_some_and(|(l, _)| l == layer))
            .collect();
        ids.sort_unstable();
        Envelope::ok(format!("{} operation(s) in layer '{layer}'", ids.len()), serde_json::json!(ids))
    }

    /// The JSON-schema-like argument description for one operation (spec
    /// §4.6 `describe_operation` mandatory meta-operation).
    pub fn describe_operation(&self, operation_id: &str) -> Result<Envelope> {
        let operation = self
            .operations
            .get(operation_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown operation '{operation_id}'")))?;
        Ok(Envelope::ok(format!("schema for '{operation_id}'"), operation.schema()))
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
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

    #[test]
    fn every_operation_id_is_namespaced_under_a_known_layer() {
        let registry = Registry::new();
        for layer in LAYERS {
            let _ = registry.list_operations(layer);
        }
        assert!(registry.operation_count() > 0);
    }

    #[tokio::test]
    async fn invoke_rejects_unknown_operation() {
        let registry = Registry::new();
        let err = registry.invoke(&ctx(), "p1", "semantic.nonexistent", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn invoke_rejects_credential_looking_arguments() {
        let registry = Registry::new();
        let err = registry
            .invoke(&ctx(), "p1", "semantic.store", serde_json::json!({"content": "x", "api_key": "sk-1"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn invoke_dispatches_to_the_matching_operation() {
        let registry = Registry::new();
        let result = registry
            .invoke(&ctx(), "p1", "semantic.store", serde_json::json!({"content": "hybrid search uses RRF"}))
            .await
            .unwrap();
        assert!(!result.data["id"].is_null());
    }

    #[test]
    fn describe_operation_returns_its_schema() {
        let registry = Registry::new();
        let envelope = registry.describe_operation("recall.query").unwrap();
        assert!(envelope.data["required"].as_array().unwrap().contains(&serde_json::json!("query_text")));
    }

    #[test]
    fn list_layers_lists_all_eight() {
        let registry = Registry::new();
        let envelope = registry.list_layers();
        assert_eq!(envelope.data.as_array().unwrap().len(), LAYERS.len());
    }
}
