//! End-to-end coverage of the six cascading scenarios through real storage
//! (`memory-storage`'s `redb` backend) and the full operation registry
//! (`memory-ops`), as opposed to the in-crate unit tests that exercise each
//! piece in isolation against a fake backend.

use std::sync::Arc;

use chrono::Utc;
use memory_core::config::{ConsolidationConfig, EngineConfig};
use memory_core::context::EngineContext;
use memory_core::hooks::{CascadeStack, HookArgs, HookDispatcher, HookId};
use memory_core::storage::StorageBackend;
use memory_core::types::{ConsolidationStrategy, Event, EventContext, EventType, Outcome};
use memory_ops::Registry;

async fn registry_ctx() -> (Registry, EngineContext, tempfile::TempDir) {
    let (storage, dir) = test_utils::open_temp_storage().await.unwrap();
    let ctx = test_utils::test_context(Arc::new(storage), Utc::now());
    (Registry::new(), ctx, dir)
}

/// Seed scenario 1: ingesting the same event payload twice within the
/// idempotency window yields one stored event and a `deduplicated` flag on
/// the second call.
#[tokio::test]
async fn dedup_ingest_reuses_the_original_event_id() {
    let (registry, ctx, _dir) = registry_ctx().await;
    let args = serde_json::json!({
        "session_id": "s1",
        "event_type": "action",
        "content": "ran tests",
        "outcome": "success",
    });

    let first = registry.invoke(&ctx, "p1", "episodic.append", args.clone()).await.unwrap();
    assert_eq!(first.data["deduplicated"], false);
    let first_id = first.data["id"].clone();

    let second = registry.invoke(&ctx, "p1", "episodic.append", args).await.unwrap();
    assert_eq!(second.data["deduplicated"], true);
    assert_eq!(second.data["id"], first_id);

    let range = registry
        .invoke(&ctx, "p1", "episodic.range", serde_json::json!({"session_id": "s1", "limit": 50}))
        .await
        .unwrap();
    assert_eq!(range.data.as_array().unwrap().len(), 1);
}

/// Seed scenario 2 (depth ≥ 2, since tier 1 only looks at an explicitly
/// seeded working-memory buffer — `recall.query`'s doc comment explains why
/// a stateless per-call operation cannot keep tier 1 warm across calls).
/// Querying "token expiry" should surface the two memories that mention
/// tokens and exclude the unrelated log-rotation memory.
#[tokio::test]
async fn tiered_recall_finds_token_memories_and_excludes_unrelated_ones() {
    let (registry, ctx, _dir) = registry_ctx().await;
    for content in [
        "JWT tokens need TTL checking for expiry",
        "Refresh tokens rotate before expiry",
        "Log rotation uses daily index",
    ] {
        registry.invoke(&ctx, "p1", "semantic.store", serde_json::json!({"content": content})).await.unwrap();
    }

    let result = registry
        .invoke(&ctx, "p1", "recall.query", serde_json::json!({"query_text": "token expiry", "depth": 2, "k": 2}))
        .await
        .unwrap();

    let hits = result.data["hits"].as_array().unwrap();
    assert!(!hits.is_empty());
    let contents: Vec<&str> = hits.iter().map(|h| h["content"].as_str().unwrap()).collect();
    assert!(contents.iter().any(|c| c.contains("JWT")));
    assert!(!contents.iter().any(|c| c.contains("Log rotation")));
}

/// Seed scenario 3 (working-memory eviction) is exercised thoroughly inside
/// `memory_core::working_memory::buffer` itself (its own unit tests replay
/// the exact I1..I4 salience/timestamp sequence from this scenario); this
/// crate only needs to confirm the buffer type is reachable and behaves the
/// same way when driven from outside `memory-core`.
#[test]
fn working_memory_capacity_is_enforced_across_the_crate_boundary() {
    use memory_core::config::WorkingMemoryConfig;
    use memory_core::working_memory::WorkingMemoryBuffer;

    let mut buffer = WorkingMemoryBuffer::new(WorkingMemoryConfig { capacity: 3, ..Default::default() });
    let now = Utc::now();
    for i in 0..5 {
        buffer.insert(test_utils::semantic_ref(uuid::Uuid::new_v4()), 0.2 + 0.1 * i as f64, now);
    }
    assert!(buffer.len() <= 3);
}

/// Seed scenario 4: a handler processing `TaskStarted` keeps that hook
/// marked in-flight on the shared cascade stack (the pattern
/// `CascadeStack`'s doc comment describes: "threaded through nested fires
/// triggered from within a hook handler") while it fans out to
/// `PostToolUse`; when that nested handler tries to fire `TaskStarted`
/// again, the stack still shows it in-flight and the re-entrant fire is
/// rejected before anything is persisted for it.
#[tokio::test]
async fn cascading_hook_that_cycles_back_to_itself_is_rejected() {
    let (storage, _dir) = test_utils::open_temp_storage().await.unwrap();
    let dispatcher = HookDispatcher::new(&memory_core::config::HooksConfig::default());
    let mut cascade = CascadeStack::new(5, 10);

    let args = |content: &str| HookArgs {
        session_id: "s1".to_string(),
        project_id: "p1".to_string(),
        content: content.to_string(),
        context: EventContext::default(),
    };

    cascade.try_push(HookId::TaskStarted).unwrap();
    let b_id = dispatcher.fire(&storage, &mut cascade, HookId::PostToolUse, args("ran a tool")).await.unwrap();

    let err = dispatcher.fire(&storage, &mut cascade, HookId::TaskStarted, args("start task again")).await.unwrap_err();
    assert_eq!(err.code(), "CASCADE_VIOLATION");

    cascade.pop();
    assert_eq!(cascade.depth(), 0, "unwinding the manual push must leave the chain clean");

    let events = StorageBackend::get_range(
        &storage,
        "p1",
        Utc::now() - chrono::Duration::hours(1),
        Utc::now() + chrono::Duration::hours(1),
        &memory_core::storage::EventFilter::default(),
    )
    .await
    .unwrap();
    assert_eq!(events.len(), 1, "only the legitimate nested fire persists an event");
    assert_eq!(events[0].id, b_id);
}

fn action_event(session_id: &str, content: &str, outcome: Outcome, embedding: Vec<f32>, now: chrono::DateTime<Utc>) -> Event {
    let mut event = Event::new("p1", session_id, EventType::Action, content, outcome, EventContext::default(), now);
    event.embedding = Some(embedding);
    event
}

/// Seed scenario 5, confident path: three cohesive, same-session, all-success
/// action events cluster together; `ToolSequenceExtractor` proposes a
/// procedure candidate whose uncertainty is low enough that it promotes
/// without System-2 review even though `use_system2` is on for `balanced`.
#[tokio::test]
async fn confident_cluster_consolidates_into_a_procedure_without_llm_review() {
    let (storage, _dir) = test_utils::open_temp_storage().await.unwrap();
    let now = Utc::now();
    for step in ["grep the error", "apply the fix", "rerun the suite"] {
        let event = action_event("s1", step, Outcome::Success, vec![1.0, 0.0, 0.0, 0.0], now);
        storage.append_event(event).await.unwrap();
    }

    let ctx = test_utils::test_context(Arc::new(storage), now);
    let registry = Registry::new();
    let result = registry
        .invoke(&ctx, "p1", "consolidation.run", serde_json::json!({"strategy": "balanced", "window": "deep"}))
        .await
        .unwrap();

    assert_eq!(result.data["events_considered"], 3);
    assert_eq!(result.data["events_consolidated"], 3);
    assert!(result.data["procedures_created"].as_u64().unwrap() >= 1);
    assert!((result.data["compression_ratio"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

/// Seed scenario 5, deferred path: the same cluster, but with
/// `validation_threshold` pinned low enough that every candidate requires
/// System-2 review, and the LLM offline. Deferred candidates are not
/// promoted and their source events stay `active`.
#[tokio::test]
async fn uncertain_cluster_defers_when_the_llm_is_unavailable() {
    let (storage, _dir) = test_utils::open_temp_storage().await.unwrap();
    let now = Utc::now();
    let mut event_ids = Vec::new();
    for step in ["grep the error", "apply the fix", "rerun the suite"] {
        let event = action_event("s1", step, Outcome::Success, vec![1.0, 0.0, 0.0, 0.0], now);
        event_ids.push(event.id);
        storage.append_event(event).await.unwrap();
    }

    let config = EngineConfig {
        consolidation: ConsolidationConfig { validation_threshold: -1.0, ..Default::default() },
        ..Default::default()
    };
    let ctx = EngineContext::new(
        Arc::new(storage),
        Arc::new(memory_core::embeddings::DeterministicEmbeddingProvider::default()),
        Arc::new(memory_core::llm::MockLlmClient { available: false, ..Default::default() }),
        Arc::new(memory_core::clock::FixedClock::new(now)),
        config,
    );

    let engine = memory_core::consolidation::ConsolidationEngine::default();
    let report = engine
        .run(
            ctx.storage.as_ref(),
            ctx.llm.as_ref(),
            ctx.embedder.as_ref(),
            &ctx.config.consolidation,
            "p1",
            ConsolidationStrategy::Balanced,
            memory_core::consolidation::ConsolidationWindow::Deep,
            now,
        )
        .await
        .unwrap();

    assert_eq!(report.events_considered, 3);
    assert_eq!(report.events_consolidated, 0);
    assert_eq!(report.procedures_created, 0);
    assert!(report.deferred_to_system2 >= 1);

    for id in event_ids {
        let event = ctx.storage.get_event("p1", id).await.unwrap().unwrap();
        assert_eq!(event.lifecycle_status, memory_core::types::LifecycleStatus::Active);
    }
}

/// Seed scenario 6: a strong-lexical/weak-semantic memory and a
/// weak-lexical/strong-semantic memory both surface for a query that only
/// lexically matches one of them, because RRF blends both rankings rather
/// than requiring agreement between them.
#[tokio::test]
async fn hybrid_search_surfaces_both_lexical_and_semantic_matches() {
    let (registry, ctx, _dir) = registry_ctx().await;
    registry
        .invoke(&ctx, "p1", "semantic.store", serde_json::json!({"content": "retry budget caps retries at three attempts"}))
        .await
        .unwrap();
    registry
        .invoke(&ctx, "p1", "semantic.store", serde_json::json!({"content": "backoff policy governs reattempt spacing"}))
        .await
        .unwrap();

    let result = registry
        .invoke(&ctx, "p1", "semantic.search", serde_json::json!({"query_text": "retry budget", "k": 5}))
        .await
        .unwrap();

    let hits = result.data.as_array().unwrap();
    let contents: Vec<&str> = hits.iter().map(|h| h["memory"]["content"].as_str().unwrap()).collect();
    assert_eq!(contents.len(), 2, "k=5 exceeds the total candidate pool, so both memories should come back");
    assert!(contents.iter().any(|c| c.contains("retry budget")));
    assert!(contents.iter().any(|c| c.contains("backoff policy")));
}
