//! `prospective.*` operations: tasks and goals (spec §3 `Task`/`Goal`,
//! §4.1 "Prospective store").

use async_trait::async_trait;
use memory_core::context::EngineContext;
use memory_core::error::{Error, Result};
use memory_core::ops::{Envelope, Operation};
use memory_core::prospective::{complete_task, transition_phase};
use memory_core::types::{Goal, Phase, Priority, Task, TaskStatus};

use crate::common::{opt_bool, opt_datetime, opt_str, parse_field, require_enum, require_str, require_uuid};

pub struct CreateTask;

#[async_trait]
impl Operation for CreateTask {
    fn id(&self) -> &'static str {
        "prospective.create_task"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["content"],
            "properties": {
                "content": {"type": "string"},
                "priority": {"type": "string", "enum": ["low", "medium", "high", "critical"]},
                "assignee": {"type": "string"},
                "due_at": {"type": "string", "format": "date-time"},
                "triggers": {"type": "array", "items": {"type": "string"}},
                "goal_id": {"type": "string"},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let content = require_str(&args, "content")?;
        let priority: Priority = crate::common::opt_enum(&args, "priority", Priority::Medium)?;
        let triggers: Vec<String> = parse_field(&args, "triggers")?.unwrap_or_default();
        let goal_id = crate::common::opt_uuid(&args, "goal_id")?;
        let now = ctx.clock.now();

        let task = Task {
            id: uuid::Uuid::new_v4(),
            project_id: project_id.to_string(),
            content: content.to_string(),
            priority,
            status: TaskStatus::Pending,
            phase: Phase::Planning,
            assignee: opt_str(&args, "assignee").map(str::to_string),
            due_at: opt_datetime(&args, "due_at")?,
            triggers,
            goal_id,
            completed_at: None,
            created_at: now,
        };
        let id = ctx.storage.upsert_task(task).await?;

        if let Some(goal_id) = goal_id {
            let mut goal = ctx.storage.get_goal(goal_id).await?.ok_or_else(|| Error::not_found_id("goal", goal_id))?;
            goal.task_ids.push(id);
            ctx.storage.upsert_goal(goal).await?;
        }
        Ok(Envelope::ok(format!("created task {id}"), serde_json::json!({"id": id})))
    }
}

pub struct GetTask;

#[async_trait]
impl Operation for GetTask {
    fn id(&self) -> &'static str {
        "prospective.get_task"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = require_uuid(&args, "id")?;
        let task = ctx.storage.get_task(id).await?.ok_or_else(|| Error::not_found_id("task", id))?;
        Ok(Envelope::ok(format!("task {id}"), serde_json::to_value(task)?))
    }
}

pub struct TransitionTaskPhase;

#[async_trait]
impl Operation for TransitionTaskPhase {
    fn id(&self) -> &'static str {
        "prospective.transition_phase"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["id", "phase"],
            "properties": {
                "id": {"type": "string"},
                "phase": {"type": "string", "enum": ["planning", "plan_ready", "executing", "verifying", "completed"]},
                "replan": {"type": "boolean", "default": false},
            }
        })
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = require_uuid(&args, "id")?;
        let next: Phase = require_enum(&args, "phase")?;
        let replan = opt_bool(&args, "replan", false);
        let mut task = ctx.storage.get_task(id).await?.ok_or_else(|| Error::not_found_id("task", id))?;
        transition_phase(&mut task, next, replan)?;
        if next == Phase::Completed {
            complete_task(&mut task, ctx.clock.now());
        }
        ctx.storage.upsert_task(task.clone()).await?;
        Ok(Envelope::ok(format!("task {id} now in phase {next:?}"), serde_json::to_value(task)?))
    }
}

pub struct CompleteTask;

#[async_trait]
impl Operation for CompleteTask {
    fn id(&self) -> &'static str {
        "prospective.complete_task"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = require_uuid(&args, "id")?;
        let mut task = ctx.storage.get_task(id).await?.ok_or_else(|| Error::not_found_id("task", id))?;
        complete_task(&mut task, ctx.clock.now());
        ctx.storage.upsert_task(task).await?;
        Ok(Envelope::ok(format!("completed task {id}"), serde_json::json!({"id": id})))
    }
}

pub struct PendingTasks;

#[async_trait]
impl Operation for PendingTasks {
    fn id(&self) -> &'static str {
        "prospective.pending"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, _args: serde_json::Value) -> Result<Envelope> {
        let tasks = ctx.storage.pending_tasks(project_id).await?;
        Ok(Envelope::ok(format!("{} pending task(s)", tasks.len()), serde_json::to_value(tasks)?))
    }
}

pub struct BlockingTasks;

#[async_trait]
impl Operation for BlockingTasks {
    fn id(&self) -> &'static str {
        "prospective.blocking"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, _args: serde_json::Value) -> Result<Envelope> {
        let tasks = ctx.storage.blocking_tasks(project_id).await?;
        Ok(Envelope::ok(format!("{} blocking task(s)", tasks.len()), serde_json::to_value(tasks)?))
    }
}

pub struct OverdueTasks;

#[async_trait]
impl Operation for OverdueTasks {
    fn id(&self) -> &'static str {
        "prospective.overdue"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, _args: serde_json::Value) -> Result<Envelope> {
        let tasks = ctx.storage.overdue_tasks(project_id, ctx.clock.now()).await?;
        Ok(Envelope::ok(format!("{} overdue task(s)", tasks.len()), serde_json::to_value(tasks)?))
    }
}

pub struct TasksByPhase;

#[async_trait]
impl Operation for TasksByPhase {
    fn id(&self) -> &'static str {
        "prospective.by_phase"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["phase"], "properties": {"phase": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let phase: Phase = require_enum(&args, "phase")?;
        let tasks = ctx.storage.tasks_by_phase(project_id, phase).await?;
        Ok(Envelope::ok(format!("{} task(s) in phase {phase:?}", tasks.len()), serde_json::to_value(tasks)?))
    }
}

pub struct TasksByGoal;

#[async_trait]
impl Operation for TasksByGoal {
    fn id(&self) -> &'static str {
        "prospective.by_goal"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["goal_id"], "properties": {"goal_id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let goal_id = require_uuid(&args, "goal_id")?;
        let tasks = ctx.storage.tasks_by_goal(goal_id).await?;
        Ok(Envelope::ok(format!("{} task(s) for goal {goal_id}", tasks.len()), serde_json::to_value(tasks)?))
    }
}

pub struct CreateGoal;

#[async_trait]
impl Operation for CreateGoal {
    fn id(&self) -> &'static str {
        "prospective.create_goal"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "required": ["name", "description"],
            "properties": {"name": {"type": "string"}, "description": {"type": "string"}}
        })
    }

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let name = require_str(&args, "name")?;
        let description = require_str(&args, "description")?;
        let goal = Goal {
            id: uuid::Uuid::new_v4(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            progress: 0,
            task_ids: Vec::new(),
            created_at: ctx.clock.now(),
        };
        let id = ctx.storage.upsert_goal(goal).await?;
        Ok(Envelope::ok(format!("created goal '{name}'"), serde_json::json!({"id": id})))
    }
}

pub struct GetGoal;

#[async_trait]
impl Operation for GetGoal {
    fn id(&self) -> &'static str {
        "prospective.get_goal"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"required": ["id"], "properties": {"id": {"type": "string"}}})
    }

    async fn execute(&self, ctx: &EngineContext, _project_id: &str, args: serde_json::Value) -> Result<Envelope> {
        let id = require_uuid(&args, "id")?;
        let goal = ctx.storage.get_goal(id).await?.ok_or_else(|| Error::not_found_id("goal", id))?;
        Ok(Envelope::ok(format!("goal '{}'", goal.name), serde_json::to_value(goal)?))
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
    async fn backward_phase_transition_without_replan_is_rejected() {
        let ctx = ctx();
        let created = CreateTask.execute(&ctx, "p1", serde_json::json!({"content": "ship it"})).await.unwrap();
        let id = created.data["id"].as_str().unwrap();
        TransitionTaskPhase
            .execute(&ctx, "p1", serde_json::json!({"id": id, "phase": "executing"}))
            .await
            .unwrap();
        let err = TransitionTaskPhase
            .execute(&ctx, "p1", serde_json::json!({"id": id, "phase": "planning"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn completing_a_task_sets_completed_at() {
        let ctx = ctx();
        let created = CreateTask.execute(&ctx, "p1", serde_json::json!({"content": "ship it"})).await.unwrap();
        let id = created.data["id"].as_str().unwrap();
        let done = CompleteTask.execute(&ctx, "p1", serde_json::json!({"id": id})).await.unwrap();
        assert_eq!(done.data["id"], id);
        let got = GetTask.execute(&ctx, "p1", serde_json::json!({"id": id})).await.unwrap();
        assert!(!got.data["completed_at"].is_null());
    }
}
