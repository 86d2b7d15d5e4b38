//! Prospective store: tasks and goals (SPEC_FULL §4.1).

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use uuid::Uuid;

use memory_core::types::{Goal, Phase, Task, TaskStatus};
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::{GOALS_TABLE, TASKS_TABLE};
use crate::RedbStorage;

impl RedbStorage {
    pub(crate) async fn upsert_task_impl(&self, task: Task) -> Result<Uuid> {
        let db = self.db.clone();
        let id = task.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(TASKS_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&task)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn get_task_impl(&self, id: Uuid) -> Result<Option<Task>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(TASKS_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn pending_tasks_impl(&self, project_id: &str) -> Result<Vec<Task>> {
        self.filter_tasks(project_id, |t| matches!(t.status, TaskStatus::Pending | TaskStatus::Active))
            .await
    }

    pub(crate) async fn tasks_by_goal_impl(&self, goal_id: Uuid) -> Result<Vec<Task>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(TASKS_TABLE).map_err(crate::storage_err)?;
            let mut tasks = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let task: Task = decode(bytes.value())?;
                if task.goal_id == Some(goal_id) {
                    tasks.push(task);
                }
            }
            Ok(tasks)
        })
        .await
    }

    pub(crate) async fn blocking_tasks_impl(&self, project_id: &str) -> Result<Vec<Task>> {
        self.filter_tasks(project_id, |t| matches!(t.status, TaskStatus::Blocked))
            .await
    }

    pub(crate) async fn overdue_tasks_impl(&self, project_id: &str, now: DateTime<Utc>) -> Result<Vec<Task>> {
        self.filter_tasks(project_id, move |t| {
            t.status != TaskStatus::Completed && t.status != TaskStatus::Cancelled && t.due_at.is_some_and(|due| due < now)
        })
        .await
    }

    pub(crate) async fn tasks_by_phase_impl(&self, project_id: &str, phase: Phase) -> Result<Vec<Task>> {
        self.filter_tasks(project_id, move |t| t.phase == phase).await
    }

    async fn filter_tasks(&self, project_id: &str, predicate: impl Fn(&Task) -> bool + Send + 'static) -> Result<Vec<Task>> {
        let project_id = project_id.to_string();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(TASKS_TABLE).map_err(crate::storage_err)?;
            let mut tasks = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let task: Task = decode(bytes.value())?;
                if task.project_id == project_id && predicate(&task) {
                    tasks.push(task);
                }
            }
            Ok(tasks)
        })
        .await
    }

    pub(crate) async fn upsert_goal_impl(&self, goal: Goal) -> Result<Uuid> {
        let db = self.db.clone();
        let id = goal.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(GOALS_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&goal)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn get_goal_impl(&self, id: Uuid) -> Result<Option<Goal>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(GOALS_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }
}
