//! Dual-process consolidation: fast statistical clustering (System 1) with
//! optional slow LLM validation (System 2) for uncertain candidates (spec
//! §4.2).

pub mod clustering;
pub mod dream;
pub mod extraction;
pub mod promotion;
pub mod report;
pub mod strategy;
pub mod validation;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::ConsolidationConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::storage::{EventFilter, StorageBackend};
use crate::types::{ConsolidationStrategy, LifecycleStatus};

use clustering::cluster_events;
use extraction::{default_strategies, PatternExtractorStrategy};
use promotion::{promote_to_memory, promote_to_procedure};
use report::ConsolidationReport;
use validation::{validate_candidate, Disposition};

/// How far back to look for consolidatable events (spec §4.2 step 1,
/// "strategy-dependent window").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationWindow {
    /// Just the current/most recent session.
    Light,
    /// The last `hours` hours.
    Balanced { hours: i64 },
    /// Every still-active event.
    Deep,
}

fn window_start(window: ConsolidationWindow, now: DateTime<Utc>) -> DateTime<Utc> {
    match window {
        ConsolidationWindow::Light => now - chrono::Duration::hours(4),
        ConsolidationWindow::Balanced { hours } => now - chrono::Duration::hours(hours),
        ConsolidationWindow::Deep => DateTime::<Utc>::MIN_UTC,
    }
}

/// Orchestrates one consolidation run end to end.
pub struct ConsolidationEngine {
    extractors: Vec<Box<dyn PatternExtractorStrategy>>,
}

impl Default for ConsolidationEngine {
    fn default() -> Self {
        Self {
            extractors: default_strategies(),
        }
    }
}

impl ConsolidationEngine {
    #[must_use]
    pub fn new(extractors: Vec<Box<dyn PatternExtractorStrategy>>) -> Self {
        Self { extractors }
    }

    /// Run one consolidation pass over `project_id`'s active events.
    pub async fn run(
        &self,
        storage: &dyn StorageBackend,
        llm: &dyn LlmClient,
        embedder: &dyn EmbeddingProvider,
        config: &ConsolidationConfig,
        project_id: &str,
        strategy: ConsolidationStrategy,
        window: ConsolidationWindow,
        now: DateTime<Utc>,
    ) -> Result<ConsolidationReport> {
        let started = now;
        let params = strategy::StrategyParams::for_strategy(strategy, *config);

        let events = storage
            .get_range(
                project_id,
                window_start(window, now),
                now,
                &EventFilter {
                    session_id: None,
                    lifecycle_status: Some(LifecycleStatus::Active),
                },
            )
            .await?;

        let mut report = ConsolidationReport {
            events_considered: events.len(),
            strategy: Some(strategy),
            ..Default::default()
        };

        let clusters = cluster_events(&events, params.cluster_tau, params.temporal_half_life_min);
        report.clusters_formed = clusters.len();

        let by_id: std::collections::HashMap<_, _> = events.iter().map(|e| (e.id, e)).collect();

        for cluster in &clusters {
            if cluster.event_ids.len() < params.min_support {
                continue;
            }
            let cluster_events_refs: Vec<&crate::types::Event> = cluster
                .event_ids
                .iter()
                .filter_map(|id| by_id.get(id).copied())
                .collect();
            if cluster_events_refs.is_empty() {
                continue;
            }

            for extractor in &self.extractors {
                let Some(candidate) = extractor.extract(&cluster_events_refs, params.temporal_half_life_min) else {
                    continue;
                };
                report.patterns_extracted += 1;

                let needs_review = params.use_system2 && candidate.uncertainty > params.validation_threshold;
                let accepted_content = if needs_review {
                    let deadline = Duration::from_millis(config.per_cluster_timeout_ms);
                    match validate_candidate(llm, &candidate, deadline).await {
                        Disposition::Accepted { content, .. } => Some(content),
                        Disposition::Rejected => {
                            report.rejected += 1;
                            None
                        }
                        Disposition::Deferred => {
                            debug!(extractor = extractor.name(), "consolidation candidate deferred to next run");
                            report.deferred_to_system2 += 1;
                            None
                        }
                    }
                } else {
                    Some(candidate.content.clone())
                };

                let Some(content) = accepted_content else {
                    continue;
                };

                let promoted = if candidate.is_procedural {
                    let name = format!("{}-{}", extractor.name(), cluster.event_ids.len());
                    let procedure = promote_to_procedure(&candidate, content, project_id, name, now);
                    storage.upsert_procedure(procedure).await.map(|_| ())
                } else {
                    match promote_to_memory(&candidate, content, project_id, embedder, now).await {
                        Ok(memory) => storage.upsert_memory(memory).await.map(|_| ()),
                        Err(err) => Err(err),
                    }
                };

                match promoted {
                    Ok(()) => {
                        if candidate.is_procedural {
                            report.procedures_created += 1;
                        } else {
                            report.memories_created += 1;
                        }
                        for event_id in &candidate.source_event_ids {
                            storage
                                .update_lifecycle(*event_id, LifecycleStatus::Consolidated, 1.0 - candidate.uncertainty)
                                .await?;
                            report.events_consolidated += 1;
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to promote consolidation candidate"),
                }
            }
        }

        report.duration_ms = (now - started).num_milliseconds().max(0) as u64;
        report.finalize();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsolidationConfig;
    use crate::embeddings::DeterministicEmbeddingProvider;
    use crate::llm::MockLlmClient;
    use crate::types::{EventContext, EventType, Outcome};

    struct FakeStorage {
        events: tokio::sync::Mutex<Vec<crate::types::Event>>,
        memories: tokio::sync::Mutex<Vec<crate::types::Memory>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for FakeStorage {
        async fn append_event(&self, event: crate::types::Event) -> Result<(uuid::Uuid, bool)> {
            let id = event.id;
            self.events.lock().await.push(event);
            Ok((id, false))
        }
        async fn get_event(&self, _: &str, id: uuid::Uuid) -> Result<Option<crate::types::Event>> {
            Ok(self.events.lock().await.iter().find(|e| e.id == id).cloned())
        }
        async fn get_range(
            &self,
            project_id: &str,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
            filter: &EventFilter,
        ) -> Result<Vec<crate::types::Event>> {
            Ok(self
                .events
                .lock()
                .await
                .iter()
                .filter(|e| e.project_id == project_id)
                .filter(|e| filter.lifecycle_status.is_none_or(|s| s == e.lifecycle_status))
                .cloned()
                .collect())
        }
        async fn get_by_session(&self, _: &str, _: &str) -> Result<Vec<crate::types::Event>> {
            Ok(vec![])
        }
        async fn update_lifecycle(&self, id: uuid::Uuid, status: LifecycleStatus, score: f64) -> Result<()> {
            let mut events = self.events.lock().await;
            if let Some(e) = events.iter_mut().find(|e| e.id == id) {
                e.lifecycle_status = status;
                e.consolidation_score = score;
            }
            Ok(())
        }
        async fn increment_activation(&self, _: uuid::Uuid, _: DateTime<Utc>) -> Result<()> {
            Ok(())
        }
        async fn archive_eligible(&self, _: &str, _: i64, _: DateTime<Utc>) -> Result<Vec<uuid::Uuid>> {
            Ok(vec![])
        }
        async fn upsert_memory(&self, memory: crate::types::Memory) -> Result<uuid::Uuid> {
            let id = memory.id;
            self.memories.lock().await.push(memory);
            Ok(id)
        }
        async fn get_memory(&self, id: uuid::Uuid) -> Result<Option<crate::types::Memory>> {
            Ok(self.memories.lock().await.iter().find(|m| m.id == id).cloned())
        }
        async fn list_memories(&self, _: &str, _: &crate::storage::MemoryFilter, _: usize) -> Result<Vec<crate::types::Memory>> {
            Ok(self.memories.lock().await.clone())
        }
        async fn semantic_search(&self, _: &str, _: &[f32], _: usize) -> Result<Vec<(crate::types::Memory, f64)>> {
            Ok(vec![])
        }
        async fn lexical_search(&self, _: &str, _: &str, _: usize) -> Result<Vec<(crate::types::Memory, f64)>> {
            Ok(vec![])
        }
        async fn touch_memory_access(&self, _: uuid::Uuid, _: DateTime<Utc>) -> Result<()> {
            Ok(())
        }
        async fn update_memory_usefulness(&self, _: uuid::Uuid, _: f64) -> Result<()> {
            Ok(())
        }
        async fn upsert_procedure(&self, procedure: crate::types::Procedure) -> Result<uuid::Uuid> {
            Ok(procedure.id)
        }
        async fn get_procedure(&self, _: uuid::Uuid) -> Result<Option<crate::types::Procedure>> {
            Ok(None)
        }
        async fn get_procedure_by_name(&self, _: &str, _: &str) -> Result<Option<crate::types::Procedure>> {
            Ok(None)
        }
        async fn list_procedures(&self, _: &str, _: usize) -> Result<Vec<crate::types::Procedure>> {
            Ok(vec![])
        }
        async fn record_execution(&self, execution: crate::types::ProcedureExecution) -> Result<uuid::Uuid> {
            Ok(execution.id)
        }
        async fn upsert_task(&self, task: crate::types::Task) -> Result<uuid::Uuid> {
            Ok(task.id)
        }
        async fn get_task(&self, _: uuid::Uuid) -> Result<Option<crate::types::Task>> {
            Ok(None)
        }
        async fn pending_tasks(&self, _: &str) -> Result<Vec<crate::types::Task>> {
            Ok(vec![])
        }
        async fn tasks_by_goal(&self, _: uuid::Uuid) -> Result<Vec<crate::types::Task>> {
            Ok(vec![])
        }
        async fn blocking_tasks(&self, _: &str) -> Result<Vec<crate::types::Task>> {
            Ok(vec![])
        }
        async fn overdue_tasks(&self, _: &str, _: DateTime<Utc>) -> Result<Vec<crate::types::Task>> {
            Ok(vec![])
        }
        async fn tasks_by_phase(&self, _: &str, _: crate::types::Phase) -> Result<Vec<crate::types::Task>> {
            Ok(vec![])
        }
        async fn upsert_goal(&self, goal: crate::types::Goal) -> Result<uuid::Uuid> {
            Ok(goal.id)
        }
        async fn get_goal(&self, _: uuid::Uuid) -> Result<Option<crate::types::Goal>> {
            Ok(None)
        }
        async fn upsert_entity(&self, entity: crate::types::Entity) -> Result<uuid::Uuid> {
            Ok(entity.id)
        }
        async fn get_entity(&self, _: uuid::Uuid) -> Result<Option<crate::types::Entity>> {
            Ok(None)
        }
        async fn find_entity(&self, _: &str, _: &str, _: &str) -> Result<Option<crate::types::Entity>> {
            Ok(None)
        }
        async fn upsert_relation(&self, relation: crate::types::Relation) -> Result<uuid::Uuid> {
            Ok(relation.id)
        }
        async fn add_observation(&self, observation: crate::types::Observation) -> Result<uuid::Uuid> {
            Ok(observation.id)
        }
        async fn neighbours(&self, _: uuid::Uuid, _: usize, _: Option<&str>) -> Result<Vec<crate::types::Entity>> {
            Ok(vec![])
        }
        async fn shortest_path(&self, _: uuid::Uuid, _: uuid::Uuid, _: usize) -> Result<Option<Vec<uuid::Uuid>>> {
            Ok(None)
        }
        async fn all_relations(&self, _: &str) -> Result<Vec<crate::types::Relation>> {
            Ok(vec![])
        }
        async fn get_cursor(&self, _: &str) -> Result<Option<crate::types::Cursor>> {
            Ok(None)
        }
        async fn put_cursor(&self, _: crate::types::Cursor) -> Result<()> {
            Ok(())
        }
    }

    fn action_event(project: &str, session: &str, content: &str, offset_s: i64) -> crate::types::Event {
        let now = Utc::now() + chrono::Duration::seconds(offset_s);
        crate::types::Event::new(project, session, EventType::Action, content, Outcome::Success, EventContext::default(), now)
    }

    #[tokio::test]
    async fn speed_strategy_promotes_without_llm_call() {
        let storage = FakeStorage {
            events: tokio::sync::Mutex::new(vec![
                action_event("proj", "s1", "rg pattern", 0),
                action_event("proj", "s1", "apply edit", 1),
                action_event("proj", "s1", "run tests", 2),
            ]),
            memories: tokio::sync::Mutex::new(vec![]),
        };
        let llm = MockLlmClient { available: false, ..Default::default() };
        let embedder = DeterministicEmbeddingProvider::new(16);
        let engine = ConsolidationEngine::default();
        let report = engine
            .run(
                &storage,
                &llm,
                &embedder,
                &ConsolidationConfig::default(),
                "proj",
                ConsolidationStrategy::Speed,
                ConsolidationWindow::Deep,
                Utc::now() + chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        assert!(report.procedures_created >= 1 || report.memories_created >= 1);
        assert_eq!(report.deferred_to_system2, 0);
    }

    #[tokio::test]
    async fn empty_project_yields_empty_report() {
        let storage = FakeStorage {
            events: tokio::sync::Mutex::new(vec![]),
            memories: tokio::sync::Mutex::new(vec![]),
        };
        let llm = MockLlmClient::default();
        let embedder = DeterministicEmbeddingProvider::new(16);
        let engine = ConsolidationEngine::default();
        let report = engine
            .run(
                &storage,
                &llm,
                &embedder,
                &ConsolidationConfig::default(),
                "proj",
                ConsolidationStrategy::Balanced,
                ConsolidationWindow::Light,
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(report.events_considered, 0);
        assert_eq!(report.compression_ratio, 0.0);
    }
}
