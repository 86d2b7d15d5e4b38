//! Semantic-memory store: upsert/list/touch plus the two search paths
//! hybrid search fuses over — vector cosine similarity and BM25 lexical
//! scoring rebuilt on demand (SPEC_FULL §4.1).

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use uuid::Uuid;

use memory_core::consolidation::clustering::cosine_similarity;
use memory_core::search::Bm25Index;
use memory_core::storage::MemoryFilter;
use memory_core::types::Memory;
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::MEMORIES_TABLE;
use crate::RedbStorage;

impl RedbStorage {
    pub(crate) async fn upsert_memory_impl(&self, memory: Memory) -> Result<Uuid> {
        let db = self.db.clone();
        let id = memory.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(MEMORIES_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&memory)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn get_memory_impl(&self, id: Uuid) -> Result<Option<Memory>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(MEMORIES_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn list_memories_impl(
        &self,
        project_id: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<Memory>> {
        let project_id = project_id.to_string();
        let filter = filter.clone();
        let db = self.db.clone();
        blocking(move || {
            let memories = all_project_memories(&db, &project_id)?;
            let mut filtered: Vec<Memory> = memories
                .into_iter()
                .filter(|m| filter.memory_type.is_none_or(|t| t == m.memory_type))
                .filter(|m| filter.tag.as_ref().is_none_or(|tag| m.tags.contains(tag)))
                .filter(|m| filter.domain.as_ref().is_none_or(|domain| m.domains.contains(domain)))
                .collect();
            filtered.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
            filtered.truncate(limit);
            Ok(filtered)
        })
        .await
    }

    pub(crate) async fn semantic_search_impl(
        &self,
        project_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(Memory, f64)>> {
        let project_id = project_id.to_string();
        let query_embedding = query_embedding.to_vec();
        let db = self.db.clone();
        blocking(move || {
            let memories = all_project_memories(&db, &project_id)?;
            let mut scored: Vec<(Memory, f64)> = memories
                .into_iter()
                .filter(|m| !m.embedding.is_empty())
                .map(|m| {
                    let score = cosine_similarity(&query_embedding, &m.embedding);
                    (m, score)
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(k);
            Ok(scored)
        })
        .await
    }

    pub(crate) async fn lexical_search_impl(
        &self,
        project_id: &str,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<(Memory, f64)>> {
        let project_id = project_id.to_string();
        let query_text = query_text.to_string();
        let db = self.db.clone();
        blocking(move || {
            let memories = all_project_memories(&db, &project_id)?;
            let corpus: Vec<(Uuid, &str)> = memories.iter().map(|m| (m.id, m.content.as_str())).collect();
            let index = Bm25Index::build(&corpus);
            let ranked = index.search(&query_text, k);
            let by_id: std::collections::HashMap<Uuid, Memory> = memories.into_iter().map(|m| (m.id, m)).collect();
            Ok(ranked
                .into_iter()
                .filter_map(|(id, score)| by_id.get(&id).cloned().map(|m| (m, score)))
                .collect())
        })
        .await
    }

    pub(crate) async fn touch_memory_access_impl(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(MEMORIES_TABLE).map_err(crate::storage_err)?;
                let id_str = id.to_string();
                let mut memory: Memory = match table.get(id_str.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(Error::not_found_id("memory", id)),
                };
                memory.last_accessed = at;
                memory.access_count += 1;
                let bytes = encode(&memory)?;
                table
                    .insert(id_str.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn update_memory_usefulness_impl(&self, id: Uuid, usefulness_score: f64) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(MEMORIES_TABLE).map_err(crate::storage_err)?;
                let id_str = id.to_string();
                let mut memory: Memory = match table.get(id_str.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(Error::not_found_id("memory", id)),
                };
                memory.usefulness_score = usefulness_score;
                let bytes = encode(&memory)?;
                table
                    .insert(id_str.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

fn all_project_memories(db: &redb::Database, project_id: &str) -> Result<Vec<Memory>> {
    let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
    let table = txn.open_table(MEMORIES_TABLE).map_err(crate::storage_err)?;
    let mut memories = Vec::new();
    for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
        let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
        let memory: Memory = decode(bytes.value())?;
        if memory.project_id == project_id {
            memories.push(memory);
        }
    }
    Ok(memories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::MemoryType;

    fn make_memory(project: &str, content: &str, embedding: Vec<f32>) -> Memory {
        let now = Utc::now();
        Memory {
            id: Uuid::new_v4(),
            project_id: project.to_string(),
            content: content.to_string(),
            memory_type: MemoryType::Fact,
            tags: vec![],
            domains: vec![],
            importance: 0.5,
            quality: 0.5,
            usefulness_score: 0.5,
            last_accessed: now,
            access_count: 0,
            source_event_ids: vec![],
            embedding,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let memory = make_memory("p1", "JWT tokens expire after 1h", vec![1.0, 0.0]);
        let id = storage.upsert_memory_impl(memory).await.unwrap();
        let fetched = storage.get_memory_impl(id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "JWT tokens expire after 1h");
    }

    #[tokio::test]
    async fn semantic_search_ranks_by_cosine_similarity() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        storage.upsert_memory_impl(make_memory("p1", "close", vec![1.0, 0.0])).await.unwrap();
        storage.upsert_memory_impl(make_memory("p1", "far", vec![0.0, 1.0])).await.unwrap();
        let results = storage.semantic_search_impl("p1", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results[0].0.content, "close");
    }

    #[tokio::test]
    async fn lexical_search_finds_matching_terms() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        storage.upsert_memory_impl(make_memory("p1", "refresh token rotation policy", vec![])).await.unwrap();
        storage.upsert_memory_impl(make_memory("p1", "unrelated log rotation schedule", vec![])).await.unwrap();
        let results = storage.lexical_search_impl("p1", "token rotation", 5).await.unwrap();
        assert_eq!(results[0].0.content, "refresh token rotation policy");
    }

    #[tokio::test]
    async fn list_memories_filters_by_tag() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let mut tagged = make_memory("p1", "tagged", vec![]);
        tagged.tags.push("auth".to_string());
        storage.upsert_memory_impl(tagged).await.unwrap();
        storage.upsert_memory_impl(make_memory("p1", "untagged", vec![])).await.unwrap();
        let filter = MemoryFilter {
            tag: Some("auth".to_string()),
            ..Default::default()
        };
        let results = storage.list_memories_impl("p1", &filter, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "tagged");
    }
}
