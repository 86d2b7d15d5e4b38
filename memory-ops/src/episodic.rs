//! `episodic.*` operations: the event log (SPEC_FULL §2, §7).

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{Envelope, Operation, Pagination};
use memory_core::storage::EventFilter;
use memory_core::types::{Cursor, Event, EventContext, EventType, LifecycleStatus, Outcome};

use crate::common::{opt_datetime, opt_enum, opt_str, opt_usize, parse_field, require_enum, require_str};

pub struct AppendEvent;

#[async_trait]
impl Operation for AppendEvent {
    fn id(&self) -> &'static str {
        "episodic.append"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["session_id", "event_type", "content"],
            "properties": {
                "session_id": {"type": "string"},
                "event_type": {"type": "string", "enum": ["action", "observation", "decision", "error", "success", "conversation"]},
                "content": {"type": "string"},
                "outcome": {"type": "string", "enum": ["success", "failure", "partial", "ongoing", "none"]},
                "importance_score": {"type": "number"},
                "task": {"type": "string"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let session_id = require_str(&args, "session_id")?;
        let event_type: EventType = require_enum(&args, "event_type")?;
        let content = require_str(&args, "content")?;
        let outcome: Outcome = opt_enum(&args, "outcome", Outcome::None)?;
        let mut context: EventContext = parse_field(&args, "context")?.unwrap_or_default();
        if let Some(task) = opt_str(&args, "task") {
            context.task = Some(task.to_string());
        }

        let mut event = Event::new(project_id, session_id, event_type, content, outcome, context, ctx.clock.now());
        if let Some(importance) = crate::common::opt_f64(&args, "importance_score") {
            event.importance_score = importance.clamp(0.0, 1.0);
        }

        let (id, deduplicated) = ctx.storage.append_event(event).await?;
        let summary = if deduplicated {
            format!("event {id} already recorded (deduplicated)")
        } else {
            format!("recorded event {id}")
        };
        Ok(Envelope::ok(summary, serde_json::json!({"id": id, "deduplicated": deduplicated})))
    }
}

pub struct GetEvent;

#[async_trait]
impl Operation for GetEvent {
    fn id(&self) -> &'static str {
        "episodic.get"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string", "format": "uuid"}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = crate::common::require_uuid(&args, "id")?;
        let event = ctx.storage.get_event(project_id, id).await?.ok_or_else(|| Error::not_found_id("event", id))?;
        Ok(Envelope::ok(format!("event {id}"), serde_json::to_value(event)?))
    }
}

pub struct RangeEvents;

#[async_trait]
impl Operation for RangeEvents {
    fn id(&self) -> &'static str {
        "episodic.range"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "from": {"type": "string", "format": "date-time"},
                "to": {"type": "string", "format": "date-time"},
                "session_id": {"type": "string"},
                "lifecycle_status": {"type": "string", "enum": ["active", "consolidated", "archived"]},
                "limit": {"type": "integer", "default": 10},
                "offset": {"type": "integer", "default": 0},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let now = ctx.clock.now();
        let from = opt_datetime(&args, "from")?.unwrap_or_else(|| now - chrono::Duration::days(7));
        let to = opt_datetime(&args, "to")?.unwrap_or(now);
        let lifecycle_status: Option<LifecycleStatus> = parse_field(&args, "lifecycle_status")?;
        let filter = EventFilter {
            session_id: opt_str(&args, "session_id").map(str::to_string),
            lifecycle_status,
        };
        let mut events = ctx.storage.get_range(project_id, from, to, &filter).await?;

        let offset = opt_usize(&args, "offset", 0);
        let limit = opt_usize(&args, "limit", 10).clamp(1, memory_core::types::MAX_PAGE_LIMIT);
        let total = events.len();
        let page = Pagination::new(Some(limit), offset, total);
        events.drain(..offset.min(events.len()));
        events.truncate(limit);

        Ok(Envelope::paginated(
            format!("{total} event(s) in range"),
            serde_json::to_value(events)?,
            serde_json::json!({"total": total}),
            page,
        ))
    }
}

pub struct EventsBySession;

#[async_trait]
impl Operation for EventsBySession {
    fn id(&self) -> &'static str {
        "episodic.by_session"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["session_id"], "properties": {"session_id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let session_id = require_str(&args, "session_id")?;
        let events = ctx.storage.get_by_session(project_id, session_id).await?;
        Ok(Envelope::ok(
            format!("{} event(s) in session '{session_id}'", events.len()),
            serde_json::to_value(events)?,
        ))
    }
}

pub struct ArchiveEligible;

#[async_trait]
impl Operation for ArchiveEligible {
    fn id(&self) -> &'static str {
        "episodic.archive_eligible"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"properties": {"retention_days": {"type": "integer"}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let retention_days = crate::common::opt_u64(&args, "retention_days")
            .map_or(ctx.config.storage.retention_days, |v| v as i64);
        let now = ctx.clock.now();
        let eligible = ctx.storage.archive_eligible(project_id, retention_days, now).await?;
        for id in &eligible {
            ctx.storage.update_lifecycle(*id, LifecycleStatus::Archived, 1.0).await?;
        }
        Ok(Envelope::ok(
            format!("archived {} event(s)", eligible.len()),
            serde_json::json!({"archived": eligible}),
        ))
    }
}

pub struct PutCursor;

#[async_trait]
impl Operation for PutCursor {
    fn id(&self) -> &'static str {
        "episodic.put_cursor"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["source_id", "cursor_data"],
            "properties": {"source_id": {"type": "string"}, "cursor_data": {"type": "object"}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let source_id = require_str(&args, "source_id")?.to_string();
        let cursor_data = args.get("cursor_data").cloned().unwrap_or(serde_json::Value::Null);
        let cursor = Cursor {
            source_id: source_id.clone(),
            cursor_data,
            updated_at: ctx.clock.now(),
        };
        ctx.storage.put_cursor(cursor).await?;
        Ok(Envelope::ok(format!("cursor '{source_id}' saved"), serde_json::json!({"source_id": source_id})))
    }
}

pub struct GetCursor;

#[async_trait]
impl Operation for GetCursor {
    fn id(&self) -> &'static str {
        "episodic.get_cursor"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["source_id"], "properties": {"source_id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let source_id = require_str(&args, "source_id")?;
        match ctx.storage.get_cursor(source_id).await? {
            Some(cursor) => Ok(Envelope::ok(format!("cursor '{source_id}'"), serde_json::to_value(cursor)?)),
            None => Ok(Envelope::ok(format!("no cursor for '{source_id}'"), serde_json::Value::Null)),
        }
    }
}
