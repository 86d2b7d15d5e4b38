//! `recall.*` operations: the tiered cascading query router (spec §4.3).
//!
//! The working-memory buffer and query cache are per-session runtime state
//! owned by the front end driving the hook dispatcher (spec §4.4), not
//! storage-backed state this crate can read back. Each `recall.query` call
//! therefore starts Tier 1 from an empty buffer unless the caller supplies
//! `working_memory` slots to seed it, and runs with a fresh (disabled)
//! cache; a long-lived front end wanting cache hits across calls should
//! keep its own `WorkingMemoryBuffer`/`QueryCache` and call
//! `memory_core::recall::recall` directly instead of through the registry.

use async_trait::async_trait;
use memory_core::config::WorkingMemoryConfig;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{Envelope, Operation};
use memory_core::recall::cache::QueryCache;
use memory_core::recall::{explain_hit, recall};
use memory_core::types::ItemRef;
use memory_core::working_memory::WorkingMemoryBuffer;

use crate::common::opt_usize;

const DEFAULT_RECALL_K: usize = 5;

pub struct RecallQuery;

#[async_trait]
impl Operation for RecallQuery {
    fn id(&self) -> &'static str {
        "recall.query"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["query_text"],
            "properties": {
                "query_text": {"type": "string"},
                "depth": {"type": "integer", "default": 2, "minimum": 1, "maximum": 3},
                "k": {"type": "integer", "default": 5},
                "working_memory": {
                    "type": "array",
                    "items": {"properties": {"id": {"type": "string"}, "salience": {"type": "number"}}},
                },
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let query_text = args
            .get("query_text")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("missing required field 'query_text'".into()))?;
        if query_text.trim().is_empty() {
            return Ok(Envelope::ok("no query", serde_json::json!({"hits": []})));
        }
        let depth = opt_usize(&args, "depth", usize::from(ctx.config.recall.default_depth)).clamp(1, 3) as u8;
        let k = opt_usize(&args, "k", DEFAULT_RECALL_K);

        let mut buffer = WorkingMemoryBuffer::new(WorkingMemoryConfig { capacity: usize::MAX, ..ctx.config.working_memory });
        let now = ctx.clock.now();
        if let Some(serde_json::Value::Array(slots)) = args.get("working_memory") {
            for slot in slots {
                let Some(id) = slot.get("id").and_then(serde_json::Value::as_str).and_then(|s| uuid::Uuid::parse_str(s).ok()) else {
                    continue;
                };
                let salience = slot.get("salience").and_then(serde_json::Value::as_f64).unwrap_or(0.5);
                buffer.insert(ItemRef { layer: memory_core::types::Layer::Semantic, id }, salience, now);
            }
        }
        let cache = QueryCache::new(0);

        let envelope = recall(
            ctx.storage.as_ref(),
            ctx.embedder.as_ref(),
            ctx.llm.as_ref(),
            &buffer,
            &cache,
            &ctx.config.recall,
            project_id,
            query_text,
            depth,
            k,
        )
        .await?;

        let hits: Vec<serde_json::Value> = envelope
            .hits
            .iter()
            .map(|h| {
                serde_json::json!({
                    "item_ref": {"layer": h.item_ref.layer, "id": h.item_ref.id},
                    "content": h.content,
                    "composite_score": h.composite_score,
                    "explanation": explain_hit(h),
                })
            })
            .collect();

        let summary = format!(
            "{} hit(s) at tier {} (confidence {:?})",
            hits.len(),
            envelope.tier_reached,
            envelope.confidence.level
        );
        let data = serde_json::json!({
            "hits": hits,
            "tier_reached": envelope.tier_reached,
            "confidence": envelope.confidence,
            "cache_hit": envelope.cache_hit,
        });
        Ok(Envelope::ok(summary, data))
    }
}
