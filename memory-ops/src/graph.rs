//! `graph.*` operations: the knowledge graph of entities, relations, and
//! observations (spec §4.1 "Graph store").

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::graph::community_detect;
use memory_core::ops::{Envelope, Operation};
use memory_core::types::{Entity, Observation, Relation};

use crate::common::{opt_f64, opt_str, opt_usize, require_str, require_uuid};

pub struct UpsertEntity;

#[async_trait]
impl Operation for UpsertEntity {
    fn id(&self) -> &'static str {
        "graph.upsert_entity"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["name", "entity_type"],
            "properties": {"name": {"type": "string"}, "entity_type": {"type": "string"}, "metadata": {"type": "object"}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let name = require_str(&args, "name")?;
        let entity_type = require_str(&args, "entity_type")?;
        let metadata = args.get("metadata").cloned().unwrap_or(serde_json::Value::Null);

        let existing = ctx.storage.find_entity(project_id, name, entity_type).await?;
        let entity = Entity {
            id: existing.as_ref().map_or_else(uuid::Uuid::new_v4, |e| e.id),
            project_id: project_id.to_string(),
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            metadata,
            created_at: existing.map_or_else(|| ctx.clock.now(), |e| e.created_at),
        };
        let id = ctx.storage.upsert_entity(entity).await?;
        Ok(Envelope::ok(format!("upserted entity '{name}'"), serde_json::json!({"id": id})))
    }
}

pub struct GetEntity;

#[async_trait]
impl Operation for GetEntity {
    fn id(&self) -> &'static str {
        "graph.get_entity"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = require_uuid(&args, "id")?;
        let entity = ctx.storage.get_entity(id).await?.ok_or_else(|| Error::not_found_id("entity", id))?;
        Ok(Envelope::ok(format!("entity '{}'", entity.name), serde_json::to_value(entity)?))
    }
}

pub struct UpsertRelation;

#[async_trait]
impl Operation for UpsertRelation {
    fn id(&self) -> &'static str {
        "graph.upsert_relation"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["from_entity", "to_entity", "relation_type"],
            "properties": {
                "from_entity": {"type": "string"},
                "to_entity": {"type": "string"},
                "relation_type": {"type": "string"},
                "strength": {"type": "number", "default": 0.5},
                "confidence": {"type": "number", "default": 0.5},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let from_entity = crate::common::require_uuid(&args, "from_entity")?;
        let to_entity = crate::common::require_uuid(&args, "to_entity")?;
        let relation_type = require_str(&args, "relation_type")?;
        let strength = opt_f64(&args, "strength").unwrap_or(0.5).clamp(0.0, 1.0);
        let confidence = opt_f64(&args, "confidence").unwrap_or(0.5).clamp(0.0, 1.0);
        let now = ctx.clock.now();

        let relation = Relation {
            id: uuid::Uuid::new_v4(),
            project_id: project_id.to_string(),
            from_entity,
            to_entity,
            relation_type: relation_type.to_string(),
            strength,
            confidence,
            valid_from: now,
            valid_to: None,
            created_at: now,
        };
        let id = ctx.storage.upsert_relation(relation).await?;
        Ok(Envelope::ok(format!("upserted relation {id}"), serde_json::json!({"id": id})))
    }
}

pub struct AddObservation;

#[async_trait]
impl Operation for AddObservation {
    fn id(&self) -> &'static str {
        "graph.add_observation"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["entity_id", "content"],
            "properties": {
                "entity_id": {"type": "string"},
                "content": {"type": "string"},
                "confidence": {"type": "number", "default": 0.5},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let entity_id = require_uuid(&args, "entity_id")?;
        let content = require_str(&args, "content")?;
        let confidence = opt_f64(&args, "confidence").unwrap_or(0.5).clamp(0.0, 1.0);
        let observation = Observation {
            id: uuid::Uuid::new_v4(),
            entity_id,
            content: content.to_string(),
            timestamp: ctx.clock.now(),
            confidence,
            superseded_by: None,
        };
        let id = ctx.storage.add_observation(observation).await?;
        Ok(Envelope::ok(format!("added observation {id}"), serde_json::json!({"id": id})))
    }
}

pub struct Neighbours;

#[async_trait]
impl Operation for Neighbours {
    fn id(&self) -> &'static str {
        "graph.neighbours"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["entity_id"],
            "properties": {
                "entity_id": {"type": "string"},
                "depth": {"type": "integer", "default": 1},
                "edge_filter": {"type": "string"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let entity_id = require_uuid(&args, "entity_id")?;
        let depth = opt_usize(&args, "depth", usize::from(ctx.config.recall.default_depth));
        let edge_filter = opt_str(&args, "edge_filter");
        let neighbours = ctx.storage.neighbours(entity_id, depth, edge_filter).await?;
        Ok(Envelope::ok(format!("{} neighbour(s)", neighbours.len()), serde_json::to_value(neighbours)?))
    }
}

pub struct ShortestPath;

#[async_trait]
impl Operation for ShortestPath {
    fn id(&self) -> &'static str {
        "graph.shortest_path"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["from", "to"],
            "properties": {"from": {"type": "string"}, "to": {"type": "string"}, "max_hops": {"type": "integer", "default": 4}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let from = crate::common::require_uuid(&args, "from")?;
        let to = crate::common::require_uuid(&args, "to")?;
        let max_hops = opt_usize(&args, "max_hops", 4);
        let path = ctx.storage.shortest_path(from, to, max_hops).await?;
        match path {
            Some(path) => Ok(Envelope::ok(format!("path of {} hop(s)", path.len().saturating_sub(1)), serde_json::to_value(path)?)),
            None => Ok(Envelope::ok("no path found", serde_json::Value::Null)),
        }
    }
}

pub struct CommunityDetect;

#[async_trait]
impl Operation for CommunityDetect {
    fn id(&self) -> &'static str {
        "graph.community_detect"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, _args: serde_json::Value) -> Result<Envelope> {
        let relations = ctx.storage.all_relations(project_id).await?;
        let communities = community_detect(&relations);
        let data: Vec<serde_json::Value> = communities
            .iter()
            .map(|c| serde_json::json!({"id": c.id, "entity_ids": c.entity_ids}))
            .collect();
        Ok(Envelope::ok(format!("{} communit(y/ies)", communities.len()), serde_json::json!(data)))
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
    async fn relation_strength_moves_toward_new_observation_on_reinsert() {
        let ctx = ctx();
        let a = UpsertEntity
            .execute(&ctx, "p1", serde_json::json!({"name": "auth-service", "entity_type": "service"}))
            .await
            .unwrap();
        let b = UpsertEntity
            .execute(&ctx, "p1", serde_json::json!({"name": "token-store", "entity_type": "service"}))
            .await
            .unwrap();
        let from = a.data["id"].as_str().unwrap();
        let to = b.data["id"].as_str().unwrap();
        UpsertRelation
            .execute(&ctx, "p1", serde_json::json!({"from_entity": from, "to_entity": to, "relation_type": "depends_on", "strength": 0.2}))
            .await
            .unwrap();
        UpsertRelation
            .execute(&ctx, "p1", serde_json::json!({"from_entity": from, "to_entity": to, "relation_type": "depends_on", "strength": 1.0}))
            .await
            .unwrap();
        let neighbours = Neighbours.execute(&ctx, "p1", serde_json::json!({"entity_id": from, "depth": 1})).await.unwrap();
        assert_eq!(neighbours.data.as_array().unwrap().len(), 1);
    }
}
