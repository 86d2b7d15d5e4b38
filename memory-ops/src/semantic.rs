//! `semantic.*` operations: the hybrid vector+BM25 memory store (spec
//! §4.1 "Semantic store with hybrid search").

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{Envelope, Operation, Pagination};
use memory_core::semantic::hybrid_search;
use memory_core::storage::MemoryFilter;
use memory_core::types::{Memory, MemoryType};

use crate::common::{opt_enum, opt_f64, opt_str, opt_usize, require_str};

pub struct StoreMemory;

#[async_trait]
impl Operation for StoreMemory {
    fn id(&self) -> &'static str {
        "semantic.store"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["content"],
            "properties": {
                "content": {"type": "string"},
                "memory_type": {"type": "string", "enum": ["fact", "pattern", "decision", "context", "principle"]},
                "tags": {"type": "array", "items": {"type": "string"}},
                "domains": {"type": "array", "items": {"type": "string"}},
                "importance": {"type": "number"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let content = require_str(&args, "content")?;
        let memory_type: MemoryType = opt_enum(&args, "memory_type", MemoryType::Fact)?;
        let tags: Vec<String> = crate::common::parse_field(&args, "tags")?.unwrap_or_default();
        let domains: Vec<String> = crate::common::parse_field(&args, "domains")?.unwrap_or_default();
        let importance = opt_f64(&args, "importance").unwrap_or(0.5).clamp(0.0, 1.0);
        let embedding = ctx.embedder.embed(content).await?;
        let now = ctx.clock.now();

        let memory = Memory {
            id: uuid::Uuid::new_v4(),
            project_id: project_id.to_string(),
            content: content.to_string(),
            memory_type,
            tags,
            domains,
            importance,
            quality: importance,
            usefulness_score: 0.5,
            last_accessed: now,
            access_count: 0,
            source_event_ids: Vec::new(),
            embedding,
            created_at: now,
        };
        let id = ctx.storage.upsert_memory(memory).await?;
        Ok(Envelope::ok(format!("stored memory {id}"), serde_json::json!({"id": id})))
    }
}

pub struct GetMemory;

#[async_trait]
impl Operation for GetMemory {
    fn id(&self) -> &'static str {
        "semantic.get"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string", "format": "uuid"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = crate::common::require_uuid(&args, "id")?;
        let memory = ctx.storage.get_memory(id).await?.ok_or_else(|| Error::not_found_id("memory", id))?;
        Ok(Envelope::ok(format!("memory {id}"), serde_json::to_value(memory)?))
    }
}

pub struct ListMemories;

#[async_trait]
impl Operation for ListMemories {
    fn id(&self) -> &'static str {
        "semantic.list"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "memory_type": {"type": "string"},
                "tag": {"type": "string"},
                "domain": {"type": "string"},
                "limit": {"type": "integer", "default": 10},
                "offset": {"type": "integer", "default": 0},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let filter = MemoryFilter {
            memory_type: crate::common::parse_field(&args, "memory_type")?,
            tag: opt_str(&args, "tag").map(str::to_string),
            domain: opt_str(&args, "domain").map(str::to_string),
        };
        let offset = opt_usize(&args, "offset", 0);
        let limit = opt_usize(&args, "limit", 10).clamp(1, memory_core::types::MAX_PAGE_LIMIT);
        let mut memories = ctx.storage.list_memories(project_id, &filter, offset + limit + 1).await?;
        let total = memories.len();
        let page = Pagination::new(Some(limit), offset, total);
        memories.drain(..offset.min(memories.len()));
        memories.truncate(limit);
        Ok(Envelope::paginated(
            format!("{total} memory(ies)"),
            serde_json::to_value(memories)?,
            serde_json::json!({"total": total}),
            page,
        ))
    }
}

pub struct SearchMemories;

#[async_trait]
impl Operation for SearchMemories {
    fn id(&self) -> &'static str {
        "semantic.search"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["query_text"],
            "properties": {"query_text": {"type": "string"}, "k": {"type": "integer", "default": 10}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let query_text = require_str(&args, "query_text")?;
        let k = opt_usize(&args, "k", 10).clamp(1, memory_core::types::MAX_PAGE_LIMIT);
        let query_embedding = ctx.embedder.embed(query_text).await?;
        let hits = hybrid_search(
            ctx.storage.as_ref(),
            project_id,
            query_text,
            &query_embedding,
            k,
            ctx.config.recall.over_fetch,
        )
        .await?;
        let now = ctx.clock.now();
        for hit in &hits {
            ctx.storage.touch_memory_access(hit.memory.id, now).await?;
        }
        let data: Vec<serde_json::Value> = hits
            .iter()
            .map(|h| {
                serde_json::json!({
                    "memory": h.memory,
                    "semantic_score": h.semantic_score,
                    "lexical_score": h.lexical_score,
                    "rank_fusion_score": h.rank_fusion_score,
                })
            })
            .collect();
        Ok(Envelope::ok(format!("{} hybrid hit(s)", hits.len()), serde_json::json!(data)))
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
    async fn store_then_search_finds_it() {
        let ctx = ctx();
        StoreMemory
            .execute(&ctx, "p1", serde_json::json!({"content": "JWT tokens need TTL checking"}))
            .await
            .unwrap();
        let result = SearchMemories
            .execute(&ctx, "p1", serde_json::json!({"query_text": "JWT TTL", "k": 5}))
            .await
            .unwrap();
        let hits = result.data.as_array().unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_memory_is_not_found() {
        let ctx = ctx();
        let err = GetMemory.execute(&ctx, "p1", serde_json::json!({"id": uuid::Uuid::new_v4().to_string()})).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
